//! # vvv_validators
//!
//! Validators shipped with vvv.
//!
//! | Id | Checks | Default files |
//! |----|--------|---------------|
//! | `tabs` | Hard tabs | `*`, except makefiles |
//! | `linelength` | Lines longer than `length` characters | `*` |
//! | `evilspace` | U+00A0 no-break spaces | `*` |
//! | `pdb` | Python debugger breakpoints | `*.py` |
//!
//! External programs are wrapped with [`CommandPlugin`].

pub mod command;
pub mod evilspace;
pub mod linelength;
pub mod pdb;
pub mod tabs;

pub use command::{CommandPlugin, CommandSpec};
pub use evilspace::EvilSpacePlugin;
pub use linelength::LineLengthPlugin;
pub use pdb::PdbPlugin;
pub use tabs::TabsPlugin;

use vvv_plugin::Plugin;

/// Constructor of a built-in validator.
pub type BuiltinFactory = fn() -> Box<dyn Plugin>;

fn new_tabs() -> Box<dyn Plugin> {
    Box::new(TabsPlugin::new())
}

fn new_linelength() -> Box<dyn Plugin> {
    Box::new(LineLengthPlugin::new())
}

fn new_evilspace() -> Box<dyn Plugin> {
    Box::new(EvilSpacePlugin::new())
}

fn new_pdb() -> Box<dyn Plugin> {
    Box::new(PdbPlugin::new())
}

/// Built-in validators in registration order.
pub fn builtins() -> Vec<(&'static str, BuiltinFactory)> {
    vec![
        ("tabs", new_tabs as BuiltinFactory),
        ("linelength", new_linelength as BuiltinFactory),
        ("evilspace", new_evilspace as BuiltinFactory),
        ("pdb", new_pdb as BuiltinFactory),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_order() {
        let ids: Vec<_> = builtins().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["tabs", "linelength", "evilspace", "pdb"]);
    }

    #[test]
    fn test_builtin_factories_construct_fresh_plugins() {
        for (id, factory) in builtins() {
            let plugin = factory();
            assert!(
                !plugin.default_matchlist().is_empty(),
                "{} has no default patterns",
                id
            );
            assert!(plugin.default_hint().is_some(), "{} has no hint", id);
        }
    }
}
