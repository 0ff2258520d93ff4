//! First-run license screen text.
//!
//! The screen has no state; accepting is handled by the shell.

pub const TITLE: &str = "Первоначальная настройка";

pub const LICENSE_TEXT: &str = "Лицензионное соглашение GNU GPL v3:\n\n\
Это программное обеспечение лицензируется под лицензией GNU GPL v3. \
Вы можете свободно использовать, изменять и распространять его, \
при условии соблюдения условий лицензии.\n\
Блог в ТГ: t.me/blogkvazi2, блог в Blogger: https://ambreon866.blogspot.com/";

pub const ACCEPT_LABEL: &str = "Принять и продолжить";
