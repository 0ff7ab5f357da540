//! Numbered action menus.

use crate::prompt::Prompter;

/// A closed set of menu actions, listed in display order.
pub trait MenuAction: Copy + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    /// Leaving the menu: ends the run at top level, returns to the caller
    /// in a sub-menu.
    fn is_exit(&self) -> bool;
}

/// Show `title` with the actions numbered `1..N` and read one selection.
/// Unmatched input is reported and the menu shown again.
pub fn select<A: MenuAction>(prompter: &mut Prompter, title: &str) -> anyhow::Result<A> {
    prompter.choose(title, A::ALL, |a| a.label().to_owned(), None)
}

/// Implement [`MenuAction`] and `clap::ValueEnum` for an action enum.
///
/// The last listed variant is the exit action. The `=>` string is both the
/// command-line value and a stable name; the second string is the label.
macro_rules! menu_actions {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $value:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
        }

        impl $crate::menu::MenuAction for $name {
            const ALL: &'static [Self] = &[$(Self::$variant,)+];

            fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            fn is_exit(&self) -> bool {
                Self::ALL.last() == Some(self)
            }
        }

        impl clap::ValueEnum for $name {
            fn value_variants<'a>() -> &'a [Self] {
                <Self as $crate::menu::MenuAction>::ALL
            }

            fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
                let (value, help) = match self {
                    $(Self::$variant => ($value, $label),)+
                };
                Some(clap::builder::PossibleValue::new(value).help(help))
            }
        }
    };
}

pub(crate) use menu_actions;
