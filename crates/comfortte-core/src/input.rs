//! Single-line text entry.

/// Editable line of text with a cursor.
///
/// The cursor counts characters, not bytes, so multi-byte input such as
/// Cyrillic edits correctly.
#[derive( Debug, Default, Clone )]
pub struct InputBuffer {
    content: String,
    cursor: usize,
}


impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }


    /// Byte offset of the `index`th character.
    fn byte_offset( &self, index: usize ) -> usize {
        self.content
            .char_indices()
            .nth( index )
            .map( |( i, _ )| i )
            .unwrap_or( self.content.len() )
    }


    fn char_count( &self ) -> usize {
        self.content.chars().count()
    }


    /// Inserts a character at the cursor position.
    pub fn insert( &mut self, c: char ) {
        let at = self.byte_offset( self.cursor );
        self.content.insert( at, c );
        self.cursor += 1;
    }


    /// Deletes the character before the cursor.
    pub fn backspace( &mut self ) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset( self.cursor );
            self.content.remove( at );
        }
    }


    /// Deletes the character under the cursor.
    pub fn delete( &mut self ) {
        if self.cursor < self.char_count() {
            let at = self.byte_offset( self.cursor );
            self.content.remove( at );
        }
    }


    pub fn clear( &mut self ) {
        self.content.clear();
        self.cursor = 0;
    }


    pub fn content( &self ) -> &str {
        &self.content
    }


    /// Cursor position in characters (for display).
    pub fn cursor( &self ) -> usize {
        self.cursor
    }


    pub fn move_left( &mut self ) {
        self.cursor = self.cursor.saturating_sub( 1 );
    }


    pub fn move_right( &mut self ) {
        self.cursor = ( self.cursor + 1 ).min( self.char_count() );
    }


    pub fn move_home( &mut self ) {
        self.cursor = 0;
    }


    pub fn move_end( &mut self ) {
        self.cursor = self.char_count();
    }


    pub fn is_empty( &self ) -> bool {
        self.content.is_empty()
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    fn typed( text: &str ) -> InputBuffer {
        let mut input = InputBuffer::new();
        text.chars().for_each( |c| input.insert( c ) );
        input
    }


    #[test]
    fn test_cyrillic_editing() {
        let mut input = typed( "секрт" );
        input.move_left();
        input.insert( 'е' );
        assert_eq!( input.content(), "секрет" );
        assert_eq!( input.cursor(), 5 );

        input.move_end();
        input.backspace();
        assert_eq!( input.content(), "секре" );
    }


    #[test]
    fn test_delete_under_cursor() {
        let mut input = typed( "abc" );
        input.move_home();
        input.delete();
        assert_eq!( input.content(), "bc" );

        input.move_end();
        input.delete();
        assert_eq!( input.content(), "bc" );
    }


    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut input = typed( "ab" );
        input.move_right();
        assert_eq!( input.cursor(), 2 );

        input.move_home();
        input.move_left();
        input.backspace();
        assert_eq!( input.cursor(), 0 );
        assert_eq!( input.content(), "ab" );

        input.clear();
        assert!( input.is_empty() );
    }
}
