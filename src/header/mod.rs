//! # Header Module
//!
//! Top bar of every page:
//! - Search box and menu/submit callbacks
//! - Vote counter (pt-BR grouping)
//! - User menu for signed-in and anonymous visitors

pub mod view;


pub use view::{
    activate, logout, Header, HeaderCallbacks, HeaderModel, MenuAction, MenuItem, UserMenu,
};
