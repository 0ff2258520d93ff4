//! ComfortTE CLI - terminal desktop shell

mod cli;
mod input;
mod logging;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ Context, Result };
use clap::Parser;
use crossterm::{
    event::{ self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind },
    terminal::{ disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen },
    ExecutableCommand,
};
use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{ Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap },
};

use comfortte_core::screens::{ easter_egg, player, setup, EasterEggScreen, FileManagerScreen, PlayerScreen };
use comfortte_core::{
    FileBrowser, InputBuffer, Notification, NotificationKind, Panel, PanelKind, Services, SettingsStore, Shell,
};

use cli::Args;
use input::InputMode;


/// Something a key press or a click on a button asks for.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
enum Action {
    Accept,
    Open( PanelKind ),
    Play,
    Stop,
    CheckSecret,
    OpenFile,
    Dismiss,
}


/// Application state.
struct App {
    shell: Shell,
    should_quit: bool,

    // Browser filter entry
    input_mode: InputMode,
    filter_input: InputBuffer,

    // Buttons drawn in the last frame, for mouse hit detection
    buttons: Vec<( Rect, Action )>,
}


impl App {
    fn new( shell: Shell ) -> Self {
        Self {
            shell,
            should_quit: false,
            input_mode: InputMode::Normal,
            filter_input: InputBuffer::new(),
            buttons: Vec::new(),
        }
    }


    /// Updates the clock and collects playback results.
    fn tick( &mut self ) {
        self.shell.tick();
    }


    fn perform( &mut self, action: Action ) {
        match action {
            Action::Accept => {
                if let Err( e ) = self.shell.accept_license() {
                    tracing::error!( "Failed to save settings: {}", e );
                    self.shell.notify( Notification::error(
                        "Ошибка",
                        format!( "Не удалось сохранить настройки: {}", e ),
                    ));
                }
            }
            Action::Open( kind ) => {
                self.input_mode = InputMode::Normal;
                self.filter_input.clear();
                self.shell.open( kind );
            }
            Action::Play => self.shell.play(),
            Action::Stop => self.shell.stop(),
            Action::CheckSecret => self.shell.check_secret(),
            Action::OpenFile => self.shell.open_selected(),
            Action::Dismiss => self.shell.dismiss_notification(),
        }
    }


    /// The browser of the open panel, if it has one.
    fn browser_mut( &mut self ) -> Option<&mut FileBrowser> {
        match self.shell.panel_mut()? {
            Panel::Player( player ) => Some( player.browser_mut() ),
            Panel::Files( files ) => Some( files.browser_mut() ),
            Panel::EasterEgg( _ ) => None,
        }
    }


    fn handle_key( &mut self, code: KeyCode, modifiers: KeyModifiers ) {
        if modifiers.contains( KeyModifiers::CONTROL ) && code == KeyCode::Char( 'c' ) {
            self.should_quit = true;
            return;
        }

        // A notification is modal
        if self.shell.notification().is_some() {
            if matches!( code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char( ' ' ) ) {
                self.perform( Action::Dismiss );
            }
            return;
        }

        if self.input_mode == InputMode::Filter {
            self.handle_filter_key( code );
            return;
        }

        if self.shell.is_setup() {
            match code {
                KeyCode::Enter => self.perform( Action::Accept ),
                KeyCode::Char( 'q' ) | KeyCode::Esc => self.should_quit = true,
                _ => {}
            }
            return;
        }

        if let Some( kind ) = function_key_shortcut( code ) {
            self.perform( Action::Open( kind ) );
            return;
        }

        match self.shell.panel().map( Panel::kind ) {
            None => self.handle_desktop_key( code ),
            Some( PanelKind::Player ) => self.handle_player_key( code ),
            Some( PanelKind::EasterEgg ) => self.handle_easter_egg_key( code ),
            Some( PanelKind::Files ) => self.handle_files_key( code ),
        }
    }


    fn handle_desktop_key( &mut self, code: KeyCode ) {
        if let Some( kind ) = digit_shortcut( code ) {
            self.perform( Action::Open( kind ) );
        } else if code == KeyCode::Char( 'q' ) {
            self.should_quit = true;
        }
    }


    /// Keys shared by every browser panel. Returns true if handled.
    fn handle_browser_key( &mut self, code: KeyCode ) -> bool {
        if let Some( kind ) = digit_shortcut( code ) {
            self.perform( Action::Open( kind ) );
            return true;
        }

        match code {
            KeyCode::Char( 'q' ) => self.should_quit = true,
            KeyCode::Esc => self.shell.close_panel(),
            KeyCode::Char( '/' ) => {
                self.input_mode = InputMode::Filter;
                self.filter_input.clear();
            }
            _ => {
                let Some( browser ) = self.browser_mut() else {
                    return false;
                };
                match code {
                    KeyCode::Up | KeyCode::Char( 'k' ) => browser.select_previous(),
                    KeyCode::Down | KeyCode::Char( 'j' ) => browser.select_next(),
                    KeyCode::Home | KeyCode::Char( 'g' ) => browser.select_first(),
                    KeyCode::End | KeyCode::Char( 'G' ) => browser.select_last(),
                    KeyCode::Backspace | KeyCode::Char( 'h' ) => browser.go_up(),
                    KeyCode::Char( 'R' ) => browser.refresh(),
                    KeyCode::Char( '~' ) => {
                        if let Some( home ) = dirs::home_dir() {
                            browser.navigate_to( &home );
                        }
                    }
                    _ => return false,
                }
            }
        }
        true
    }


    fn handle_player_key( &mut self, code: KeyCode ) {
        if self.handle_browser_key( code ) {
            return;
        }

        match code {
            KeyCode::Enter | KeyCode::Char( 'l' ) => {
                if let Some( Panel::Player( player ) ) = self.shell.panel_mut() {
                    player.choose_selected();
                }
            }
            KeyCode::Char( 'p' ) | KeyCode::Char( ' ' ) => self.perform( Action::Play ),
            KeyCode::Char( 's' ) => self.perform( Action::Stop ),
            _ => {}
        }
    }


    fn handle_files_key( &mut self, code: KeyCode ) {
        if self.handle_browser_key( code ) {
            return;
        }

        if matches!( code, KeyCode::Enter | KeyCode::Char( 'l' ) | KeyCode::Char( 'o' ) ) {
            self.perform( Action::OpenFile );
        }
    }


    fn handle_easter_egg_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Enter => {
                self.perform( Action::CheckSecret );
                return;
            }
            KeyCode::Esc => {
                self.shell.close_panel();
                return;
            }
            _ => {}
        }

        let Some( Panel::EasterEgg( screen ) ) = self.shell.panel_mut() else {
            return;
        };
        let input = screen.input_mut();
        match code {
            KeyCode::Char( c ) => input.insert( c ),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            _ => {}
        }
    }


    fn handle_filter_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                return;
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.filter_input.clear();
            }
            KeyCode::Backspace => self.filter_input.backspace(),
            KeyCode::Char( c ) => self.filter_input.insert( c ),
            _ => return,
        }

        let filter = self.filter_input.content().to_string();
        if let Some( browser ) = self.browser_mut() {
            browser.set_filter( filter );
        }
    }


    fn handle_mouse( &mut self, column: u16, row: u16, kind: MouseEventKind ) {
        match kind {
            MouseEventKind::Down( MouseButton::Left ) => {
                let modal = self.shell.notification().is_some();
                let hit = self.buttons
                    .iter()
                    .rev()
                    .find( |( area, _ )| area.contains( Position { x: column, y: row } ) )
                    .map( |( _, action )| *action );

                if let Some( action ) = hit {
                    if !modal || action == Action::Dismiss {
                        self.perform( action );
                    }
                }
            }
            MouseEventKind::ScrollUp => {
                if let Some( browser ) = self.browser_mut() {
                    browser.select_previous();
                }
            }
            MouseEventKind::ScrollDown => {
                if let Some( browser ) = self.browser_mut() {
                    browser.select_next();
                }
            }
            _ => {}
        }
    }
}


fn function_key_shortcut( code: KeyCode ) -> Option<PanelKind> {
    match code {
        KeyCode::F( n @ 1..=3 ) => PanelKind::ALL.get( n as usize - 1 ).copied(),
        _ => None,
    }
}


fn digit_shortcut( code: KeyCode ) -> Option<PanelKind> {
    match code {
        KeyCode::Char( c @ '1'..='3' ) => PanelKind::ALL.get( c as usize - '1' as usize ).copied(),
        _ => None,
    }
}


fn main() -> Result<()> {
    let args = Args::parse();

    logging::init( args.log.as_deref() )?;

    let store = match &args.settings {
        Some( path ) => SettingsStore::at( path ),
        None => SettingsStore::new()?,
    };

    let start_dir = args.dir.clone()
        .or_else( dirs::home_dir )
        .or_else( || std::env::current_dir().ok() )
        .unwrap_or_else( || PathBuf::from( "." ) );

    // Load before touching the terminal so a corrupt file reports cleanly
    let shell = Shell::start( store, Services::system( start_dir ) )
        .context( "Failed to start desktop" )?;
    let mut app = App::new( shell );

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute( EnterAlternateScreen )?;
    io::stdout().execute( crossterm::event::EnableMouseCapture )?;

    let mut terminal = Terminal::new( CrosstermBackend::new( io::stdout() ) )?;

    let result = run( &mut terminal, &mut app );

    // Cleanup
    io::stdout().execute( crossterm::event::DisableMouseCapture )?;
    disable_raw_mode()?;
    io::stdout().execute( LeaveAlternateScreen )?;

    result
}


fn run( terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App ) -> Result<()> {
    loop {
        app.tick();

        terminal.draw( |frame| draw_ui( frame, app ) )?;

        if event::poll( Duration::from_millis( 100 ) )? {
            match event::read()? {
                Event::Key( key ) if key.kind == KeyEventKind::Press => {
                    app.handle_key( key.code, key.modifiers );
                }
                Event::Mouse( mouse ) => {
                    app.handle_mouse( mouse.column, mouse.row, mouse.kind );
                }
                _ => {}
            }
        }

        if app.should_quit {
            tracing::info!( "Quitting" );
            return Ok(());
        }
    }
}


/// Draws the whole screen.
fn draw_ui( frame: &mut Frame, app: &mut App ) {
    app.buttons.clear();
    let area = frame.area();

    if app.shell.is_setup() {
        draw_setup( frame, area, &mut app.buttons );
    } else {
        let chunks = Layout::default()
            .direction( Direction::Vertical )
            .constraints([
                Constraint::Length( 3 ),  // Status bar
                Constraint::Length( 3 ),  // Shortcuts
                Constraint::Min( 0 ),     // Panel
                Constraint::Length( 1 ),  // Key hints
            ])
            .split( area );

        draw_status_bar( frame, app.shell.clock(), chunks[0] );

        let active = app.shell.panel().map( Panel::kind );
        draw_shortcuts( frame, active, chunks[1], &mut app.buttons );

        match app.shell.panel() {
            None => draw_empty_desktop( frame, chunks[2] ),
            Some( Panel::Player( player ) ) => {
                draw_player( frame, player, &app.filter_input, app.input_mode, chunks[2], &mut app.buttons );
            }
            Some( Panel::EasterEgg( screen ) ) => draw_easter_egg( frame, screen, chunks[2], &mut app.buttons ),
            Some( Panel::Files( files ) ) => {
                draw_files( frame, files, &app.filter_input, app.input_mode, chunks[2], &mut app.buttons );
            }
        }

        draw_hints( frame, app, chunks[3] );
    }

    if let Some( note ) = app.shell.notification() {
        draw_notification( frame, note, area, &mut app.buttons );
    }
}


/// Draws a bordered, centred label and records it as clickable.
fn draw_button(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    highlighted: bool,
    action: Action,
    buttons: &mut Vec<( Rect, Action )>,
) {
    let style = if highlighted {
        Style::default().fg( Color::Black ).bg( Color::Cyan ).bold()
    } else {
        Style::default().fg( Color::White ).bg( Color::Blue )
    };

    let button = Paragraph::new( label )
        .alignment( Alignment::Center )
        .style( style )
        .block( Block::default().borders( Borders::ALL ) );
    frame.render_widget( button, area );
    buttons.push(( area, action ));
}


fn draw_setup( frame: &mut Frame, area: Rect, buttons: &mut Vec<( Rect, Action )> ) {
    let chunks = Layout::default()
        .direction( Direction::Vertical )
        .constraints([
            Constraint::Length( 3 ),
            Constraint::Min( 0 ),
            Constraint::Length( 3 ),
        ])
        .split( area );

    let title = Paragraph::new( setup::TITLE )
        .alignment( Alignment::Center )
        .style( Style::default().fg( Color::Cyan ).bold() )
        .block( Block::default().borders( Borders::BOTTOM ) );
    frame.render_widget( title, chunks[0] );

    let license = Paragraph::new( setup::LICENSE_TEXT )
        .wrap( Wrap { trim: false } )
        .block( Block::default().borders( Borders::ALL ).padding( ratatui::widgets::Padding::horizontal( 1 ) ) );
    frame.render_widget( license, chunks[1] );

    draw_button( frame, chunks[2], setup::ACCEPT_LABEL, true, Action::Accept, buttons );
}


fn draw_status_bar( frame: &mut Frame, clock: &str, area: Rect ) {
    let status = Paragraph::new( clock )
        .alignment( Alignment::Right )
        .style( Style::default().fg( Color::White ) )
        .block(
            Block::default()
                .title( " ComfortTE " )
                .borders( Borders::ALL )
                .border_style( Style::default().fg( Color::Cyan ) )
        );
    frame.render_widget( status, area );
}


fn draw_shortcuts( frame: &mut Frame, active: Option<PanelKind>, area: Rect, buttons: &mut Vec<( Rect, Action )> ) {
    let cells = Layout::default()
        .direction( Direction::Horizontal )
        .constraints( PanelKind::ALL.map( |_| Constraint::Ratio( 1, PanelKind::ALL.len() as u32 ) ) )
        .split( area );

    for ( i, ( kind, cell ) ) in PanelKind::ALL.iter().zip( cells.iter() ).enumerate() {
        let label = format!( "[{}] {}", i + 1, kind.label() );
        draw_button( frame, *cell, &label, active == Some( *kind ), Action::Open( *kind ), buttons );
    }
}


fn draw_empty_desktop( frame: &mut Frame, area: Rect ) {
    let hint = Paragraph::new( "Выберите приложение на панели выше" )
        .alignment( Alignment::Center )
        .style( Style::default().fg( Color::DarkGray ) )
        .block( Block::default().borders( Borders::ALL ) );
    frame.render_widget( hint, area );
}


fn draw_browser( frame: &mut Frame, browser: &FileBrowser, filter: Option<&InputBuffer>, area: Rect ) {
    let path_str = browser.current_dir().display().to_string();
    let char_count = path_str.chars().count();
    let mut title = if char_count > 50 {
        let tail: String = path_str.chars().skip( char_count - 47 ).collect();
        format!( " ...{} ", tail )
    } else {
        format!( " {} ", path_str )
    };
    if let Some( input ) = filter {
        title.push_str( &format!( "[/{}] ", input.content() ) );
    } else if !browser.filter().is_empty() {
        title.push_str( &format!( "[{}] ", browser.filter() ) );
    }

    let items: Vec<ListItem> = browser.visible_entries()
        .iter()
        .map( |entry| {
            let ( icon, style ) = if entry.is_dir {
                ( "▸", Style::default().fg( Color::Blue ) )
            } else {
                ( " ", Style::default().fg( Color::Green ) )
            };
            ListItem::new( format!( " {} {}", icon, entry.name ) ).style( style )
        })
        .collect();

    let mut state = ListState::default();
    state.select( Some( browser.selected_index() ) );

    let list = List::new( items )
        .block( Block::default().title( title ).borders( Borders::ALL ) )
        .highlight_style( Style::default().bg( Color::DarkGray ) )
        .highlight_symbol( ">> " );

    frame.render_stateful_widget( list, area, &mut state );
}


fn draw_player(
    frame: &mut Frame,
    player: &PlayerScreen,
    filter_input: &InputBuffer,
    input_mode: InputMode,
    area: Rect,
    buttons: &mut Vec<( Rect, Action )>,
) {
    let chunks = Layout::default()
        .direction( Direction::Vertical )
        .constraints([
            Constraint::Length( 3 ),
            Constraint::Min( 0 ),
            Constraint::Length( 3 ),
        ])
        .split( area );

    let status = Paragraph::new( player.status() )
        .style( Style::default().fg( Color::White ) )
        .block( Block::default().title( " MP3 Плеер " ).borders( Borders::ALL ) );
    frame.render_widget( status, chunks[0] );

    let filter = ( input_mode == InputMode::Filter ).then_some( filter_input );
    draw_browser( frame, player.browser(), filter, chunks[1] );

    let controls = Layout::default()
        .direction( Direction::Horizontal )
        .constraints([ Constraint::Ratio( 1, 2 ), Constraint::Ratio( 1, 2 ) ])
        .split( chunks[2] );
    draw_button( frame, controls[0], player::PLAY_LABEL, false, Action::Play, buttons );
    draw_button( frame, controls[1], player::STOP_LABEL, false, Action::Stop, buttons );
}


fn draw_easter_egg( frame: &mut Frame, screen: &EasterEggScreen, area: Rect, buttons: &mut Vec<( Rect, Action )> ) {
    let chunks = Layout::default()
        .direction( Direction::Vertical )
        .constraints([
            Constraint::Length( 2 ),
            Constraint::Length( 3 ),
            Constraint::Length( 3 ),
            Constraint::Min( 0 ),
        ])
        .split( area );

    let title = Paragraph::new( easter_egg::TITLE )
        .alignment( Alignment::Center )
        .style( Style::default().fg( Color::White ).bold() );
    frame.render_widget( title, chunks[0] );

    let input = screen.input();
    let text = if input.is_empty() {
        Span::styled( easter_egg::HINT, Style::default().fg( Color::DarkGray ) )
    } else {
        Span::raw( input.content() )
    };
    let ( scroll, column ) = field_cursor( chunks[1], input.cursor() );
    let field = Paragraph::new( Line::from( text ) )
        .scroll(( 0, scroll ))
        .block( Block::default().borders( Borders::ALL ).border_style( Style::default().fg( Color::Yellow ) ) );
    frame.render_widget( field, chunks[1] );
    frame.set_cursor_position(( column, chunks[1].y + 1 ));

    draw_button( frame, chunks[2], easter_egg::CHECK_LABEL, false, Action::CheckSecret, buttons );
}


fn draw_files(
    frame: &mut Frame,
    files: &FileManagerScreen,
    filter_input: &InputBuffer,
    input_mode: InputMode,
    area: Rect,
    buttons: &mut Vec<( Rect, Action )>,
) {
    let chunks = Layout::default()
        .direction( Direction::Vertical )
        .constraints([ Constraint::Min( 0 ), Constraint::Length( 3 ) ])
        .split( area );

    let filter = ( input_mode == InputMode::Filter ).then_some( filter_input );
    draw_browser( frame, files.browser(), filter, chunks[0] );
    draw_button( frame, chunks[1], "Открыть", false, Action::OpenFile, buttons );
}


fn draw_hints( frame: &mut Frame, app: &App, area: Rect ) {
    let hint = if app.input_mode == InputMode::Filter {
        " Filter: type to narrow [Enter]Keep [Esc]Clear "
    } else {
        match app.shell.panel().map( Panel::kind ) {
            None => " [1-3]Open app [q]Quit ",
            Some( PanelKind::Player ) => " [↑↓]Move [Enter]Select [p]Play [s]Stop [/]Filter [Esc]Close [q]Quit ",
            Some( PanelKind::EasterEgg ) => " Type the code [Enter]Check [F1-F3]Apps [Esc]Close ",
            Some( PanelKind::Files ) => " [↑↓]Move [Enter]Open [Backspace]Up [/]Filter [Esc]Close [q]Quit ",
        }
    };

    let hints = Paragraph::new( hint ).style( Style::default().fg( Color::DarkGray ) );
    frame.render_widget( hints, area );
}


fn draw_notification( frame: &mut Frame, note: &Notification, area: Rect, buttons: &mut Vec<( Rect, Action )> ) {
    let popup = centered_rect( 60, 40, area );
    let color = match note.kind {
        NotificationKind::Success => Color::Green,
        NotificationKind::Error => Color::Red,
    };

    let body = Paragraph::new( vec![
        Line::from( "" ),
        Line::from( note.message.as_str() ),
        Line::from( "" ),
        Line::from( Span::styled( "[Enter] OK", Style::default().fg( Color::DarkGray ) ) ),
    ])
        .alignment( Alignment::Center )
        .wrap( Wrap { trim: true } )
        .block(
            Block::default()
                .title( format!( " {} ", note.title ) )
                .borders( Borders::ALL )
                .border_style( Style::default().fg( color ) )
        );

    frame.render_widget( Clear, popup );
    frame.render_widget( body, popup );
    buttons.push(( popup, Action::Dismiss ));
}


/// Horizontal scroll and cursor column for a bordered one-line field.
///
/// Long input scrolls so the cursor stays inside the border.
fn field_cursor( field: Rect, cursor: usize ) -> ( u16, u16 ) {
    let visible = field.width.saturating_sub( 2 ).max( 1 ) as usize;
    let scroll = cursor.saturating_sub( visible - 1 );
    let scroll = u16::try_from( scroll ).unwrap_or( u16::MAX );
    let offset = cursor.min( visible - 1 ) as u16;
    ( scroll, field.x + 1 + offset )
}


/// A rectangle of the given percentage size centred in `area`.
fn centered_rect( percent_x: u16, percent_y: u16, area: Rect ) -> Rect {
    let vertical = Layout::default()
        .direction( Direction::Vertical )
        .constraints([
            Constraint::Percentage( ( 100 - percent_y ) / 2 ),
            Constraint::Percentage( percent_y ),
            Constraint::Percentage( ( 100 - percent_y ) / 2 ),
        ])
        .split( area );

    Layout::default()
        .direction( Direction::Horizontal )
        .constraints([
            Constraint::Percentage( ( 100 - percent_x ) / 2 ),
            Constraint::Percentage( percent_x ),
            Constraint::Percentage( ( 100 - percent_x ) / 2 ),
        ])
        .split( vertical[1] )[1]
}


#[cfg( test )]
mod tests {
    use super::*;
    use std::fs;


    fn app( first_run: bool ) -> ( tempfile::TempDir, App ) {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join( "settings.json" );
        if !first_run {
            fs::write( &settings, r#"{"first_run": false}"# ).unwrap();
        }
        fs::write( dir.path().join( "song.mp3" ), b"" ).unwrap();

        let shell = Shell::start( SettingsStore::at( &settings ), Services::system( dir.path().to_path_buf() ) ).unwrap();
        ( dir, App::new( shell ) )
    }


    fn press( app: &mut App, code: KeyCode ) {
        app.handle_key( code, KeyModifiers::NONE );
    }


    #[test]
    fn test_enter_accepts_license() {
        let ( dir, mut app ) = app( true );
        assert!( app.shell.is_setup() );

        press( &mut app, KeyCode::Enter );
        assert!( !app.shell.is_setup() );
        assert!( dir.path().join( "settings.json" ).exists() );
    }


    #[test]
    fn test_digits_switch_panels() {
        let ( _dir, mut app ) = app( false );

        press( &mut app, KeyCode::Char( '1' ) );
        assert_eq!( app.shell.panel().map( Panel::kind ), Some( PanelKind::Player ) );

        press( &mut app, KeyCode::Char( '3' ) );
        assert_eq!( app.shell.panel().map( Panel::kind ), Some( PanelKind::Files ) );

        press( &mut app, KeyCode::Esc );
        assert!( app.shell.panel().is_none() );
    }


    #[test]
    fn test_typing_secret_shows_notification() {
        let ( _dir, mut app ) = app( false );

        press( &mut app, KeyCode::F( 2 ) );
        for c in "секрет".chars() {
            press( &mut app, KeyCode::Char( c ) );
        }
        press( &mut app, KeyCode::Enter );
        assert_eq!( app.shell.notification().map( |n| n.kind ), Some( NotificationKind::Success ) );

        // Modal: shortcuts are swallowed until dismissed
        press( &mut app, KeyCode::F( 1 ) );
        assert_eq!( app.shell.panel().map( Panel::kind ), Some( PanelKind::EasterEgg ) );

        press( &mut app, KeyCode::Enter );
        assert!( app.shell.notification().is_none() );
    }


    #[test]
    fn test_digits_are_text_in_easter_egg() {
        let ( _dir, mut app ) = app( false );

        press( &mut app, KeyCode::Char( '2' ) );
        press( &mut app, KeyCode::Char( '1' ) );
        match app.shell.panel() {
            Some( Panel::EasterEgg( screen ) ) => assert_eq!( screen.input().content(), "1" ),
            other => panic!( "unexpected panel {:?}", other ),
        }
    }


    #[test]
    fn test_filter_mode_narrows_player_browser() {
        let ( _dir, mut app ) = app( false );

        press( &mut app, KeyCode::Char( '1' ) );
        press( &mut app, KeyCode::Char( '/' ) );
        for c in "zzz".chars() {
            press( &mut app, KeyCode::Char( c ) );
        }
        assert_eq!( app.browser_mut().map( |b| b.len() ), Some( 1 ) );

        press( &mut app, KeyCode::Esc );
        assert_eq!( app.input_mode, InputMode::Normal );
        assert_eq!( app.browser_mut().map( |b| b.len() ), Some( 2 ) );
    }


    #[test]
    fn test_selecting_song_in_player() {
        let ( dir, mut app ) = app( false );

        press( &mut app, KeyCode::Char( '1' ) );
        press( &mut app, KeyCode::Char( 'G' ) );
        press( &mut app, KeyCode::Enter );
        match app.shell.panel() {
            Some( Panel::Player( player ) ) => {
                assert_eq!( player.selected(), Some( dir.path().join( "song.mp3" ).as_path() ) );
            }
            other => panic!( "unexpected panel {:?}", other ),
        }
    }


    #[test]
    fn test_ctrl_c_quits_from_text_entry() {
        let ( _dir, mut app ) = app( false );

        press( &mut app, KeyCode::Char( '2' ) );
        press( &mut app, KeyCode::Char( 'q' ) );
        assert!( !app.should_quit );

        app.handle_key( KeyCode::Char( 'c' ), KeyModifiers::CONTROL );
        assert!( app.should_quit );
    }


    #[test]
    fn test_click_on_shortcut_button() {
        let ( _dir, mut app ) = app( false );
        let button = Rect::new( 0, 3, 20, 3 );
        app.buttons.push(( button, Action::Open( PanelKind::Files ) ));

        app.handle_mouse( 5, 4, MouseEventKind::Down( MouseButton::Left ) );
        assert_eq!( app.shell.panel().map( Panel::kind ), Some( PanelKind::Files ) );
    }


    #[test]
    fn test_field_cursor_stays_inside_border() {
        let field = Rect::new( 4, 2, 12, 3 );

        assert_eq!( field_cursor( field, 0 ), ( 0, 5 ) );
        assert_eq!( field_cursor( field, 9 ), ( 0, 14 ) );

        // Ten visible cells; typing past them scrolls instead
        assert_eq!( field_cursor( field, 10 ), ( 1, 14 ) );
        assert_eq!( field_cursor( field, 40 ), ( 31, 14 ) );
        assert!( field_cursor( field, 40 ).1 < field.right() - 1 );
    }


    #[test]
    fn test_centered_rect_inside_area() {
        let area = Rect::new( 0, 0, 100, 50 );
        let popup = centered_rect( 60, 40, area );
        assert_eq!( popup.width, 60 );
        assert_eq!( popup.height, 20 );
        assert_eq!( popup.x, 20 );
    }
}
