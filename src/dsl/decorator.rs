//! Decorator table — color names to ANSI escape sequences.
//!
//! Four families share the eight base colors: plain (`red`), underlined
//! (`_red`), background (`+red`) and intense (`!red`). `grey` is an alias for
//! intense black.

/// Restores the terminal's default style. Seeds the player's color stack.
pub const RESET: &str = "\x1b[0m";

/// Every decorator name paired with its escape sequence.
pub static DECORATORS: &[(&str, &str)] = &[
    ("black", "\x1b[0;30m"),
    ("red", "\x1b[0;31m"),
    ("green", "\x1b[0;32m"),
    ("yellow", "\x1b[0;33m"),
    ("blue", "\x1b[0;34m"),
    ("purple", "\x1b[0;35m"),
    ("cyan", "\x1b[0;36m"),
    ("white", "\x1b[0;37m"),
    ("grey", "\x1b[0;90m"),
    ("_black", "\x1b[4;30m"),
    ("_red", "\x1b[4;31m"),
    ("_green", "\x1b[4;32m"),
    ("_yellow", "\x1b[4;33m"),
    ("_blue", "\x1b[4;34m"),
    ("_purple", "\x1b[4;35m"),
    ("_cyan", "\x1b[4;36m"),
    ("_white", "\x1b[4;37m"),
    ("+black", "\x1b[0;40m"),
    ("+red", "\x1b[0;41m"),
    ("+green", "\x1b[0;42m"),
    ("+yellow", "\x1b[0;43m"),
    ("+blue", "\x1b[0;44m"),
    ("+purple", "\x1b[0;45m"),
    ("+cyan", "\x1b[0;46m"),
    ("+white", "\x1b[0;47m"),
    ("!black", "\x1b[0;90m"),
    ("!red", "\x1b[0;91m"),
    ("!green", "\x1b[0;92m"),
    ("!yellow", "\x1b[0;93m"),
    ("!blue", "\x1b[0;94m"),
    ("!purple", "\x1b[0;95m"),
    ("!cyan", "\x1b[0;96m"),
    ("!white", "\x1b[0;97m"),
];

/// Look up a decorator name. Matching is exact and case-sensitive.
pub fn lookup(name: &str) -> Option<&'static str> {
    DECORATORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}
