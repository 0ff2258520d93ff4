//! Settings panel hiding the easter-egg code check.

use crate::input::InputBuffer;
use crate::shell::Notification;


/// The code that unlocks the easter egg. Compared exactly.
const SECRET: &str = "секрет";

pub const TITLE: &str = "Настройки";
pub const HINT: &str = "Введите код для пасхалки";
pub const CHECK_LABEL: &str = "Проверить код";


#[derive( Debug, Default )]
pub struct EasterEggScreen {
    input: InputBuffer,
}


impl EasterEggScreen {
    pub fn new() -> Self {
        Self::default()
    }


    pub fn input( &self ) -> &InputBuffer {
        &self.input
    }


    pub fn input_mut( &mut self ) -> &mut InputBuffer {
        &mut self.input
    }


    /// Compares the entered text with the secret.
    pub fn check( &self ) -> Notification {
        if self.input.content() == SECRET {
            tracing::info!( "Easter egg found" );
            Notification::success( "Пасхалка", "Вы нашли пасхалку!" )
        } else {
            Notification::error( "Ошибка", "Неверный код!" )
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::shell::NotificationKind;


    fn check( text: &str ) -> Notification {
        let mut screen = EasterEggScreen::new();
        text.chars().for_each( |c| screen.input_mut().insert( c ) );
        screen.check()
    }


    #[test]
    fn test_exact_secret_succeeds() {
        let note = check( "секрет" );
        assert_eq!( note.kind, NotificationKind::Success );
        assert_eq!( note.message, "Вы нашли пасхалку!" );
    }


    #[test]
    fn test_other_text_fails() {
        for text in [ "", "Секрет", "секрет ", " секрет", "secret", "СЕКРЕТ" ] {
            let note = check( text );
            assert_eq!( note.kind, NotificationKind::Error, "{:?}", text );
            assert_eq!( note.message, "Неверный код!" );
        }
    }
}
