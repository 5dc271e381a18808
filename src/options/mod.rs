//! Option Builder: the option blocks of a reply.

mod builder;

pub use builder::{
    hostname_option, pxe_options, OptionWriter, StandardOptions, MENU_PROMPT,
    MENU_PROMPT_TIMEOUT,
};
