//! Option declarations and their validators.
//!
//! Options are grouped into modules ([`link`], [`preprocess`], [`c`],
//! [`cxx`]). A module is just a list of descriptors; combining modules is a
//! union by name, so options shared between the C and C++ modules are
//! registered once.
//!
//! During [`Registry::finalize`] every option is parsed, stored, and then
//! handed to its check. Checks run in registration order, so an option's
//! check may rely on every option registered before it.

use crate::error::{ConfigError, ProbeError};
use crate::probe::{Dialect, ProbeContext, check_toolchain};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

/// Turns the textual value of an option into tokens. `None` means the text is malformed.
pub type Parser = fn(&str) -> Option<Vec<String>>;

/// Runs after an option's value has been stored.
pub type Check = fn(&mut ProbeContext, &[String]) -> Result<(), ProbeError>;

#[derive(Debug, Clone)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub init: Vec<String>,
    pub parse: Parser,
    pub check: Check,
    pub hidden: bool,
    pub help: &'static str,
}

impl OptionDescriptor {
    /// A visible option whose value is split with POSIX shell rules.
    pub fn new(name: &'static str, init: &[&str], check: Check, help: &'static str) -> Self {
        Self {
            name,
            init: init.iter().map(|s| s.to_string()).collect(),
            parse: shell,
            check,
            hidden: false,
            help,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// The default value as it would be written on the command line.
    pub fn default_text(&self) -> String {
        join(&self.init)
    }
}

/// Splits `text` into words with POSIX shell quoting. A word starting with `#` is kept.
pub fn shell(text: &str) -> Option<Vec<String>> {
    shlex::split(&escape_comments(text))
}

/// Backslash-escapes every unquoted `#` that begins a word, which shlex would
/// otherwise read as the start of a comment.
fn escape_comments(text: &str) -> Cow<'_, str> {
    if !text.contains('#') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 4);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut word_start = true;
    for ch in text.chars() {
        let mut next_starts_word = false;
        if escaped {
            escaped = false;
        } else if let Some(q) = quote {
            if ch == q {
                quote = None;
            } else if q == '"' && ch == '\\' {
                escaped = true;
            }
        } else {
            match ch {
                '\\' => escaped = true,
                '\'' | '"' => quote = Some(ch),
                '#' if word_start => out.push('\\'),
                ' ' | '\t' | '\n' => next_starts_word = true,
                _ => {}
            }
        }
        word_start = next_starts_word;
        out.push(ch);
    }
    Cow::Owned(out)
}

/// Quotes `tokens` so that [`shell`] splits the result back into the same tokens.
pub fn join(tokens: &[String]) -> String {
    shlex::try_join(tokens.iter().map(String::as_str))
        .unwrap_or_else(|_| tokens.join(" "))
}

fn check_ldflags(_: &mut ProbeContext, _: &[String]) -> Result<(), ProbeError> {
    Ok(())
}

fn check_libs(ctx: &mut ProbeContext, _: &[String]) -> Result<(), ProbeError> {
    // make(1) links with $(LDLIBS), not $(LIBS)
    ctx.vars.rename("LIBS", "LDLIBS")
}

fn check_cppflags(_: &mut ProbeContext, _: &[String]) -> Result<(), ProbeError> {
    Ok(())
}

fn check_cc(_: &mut ProbeContext, _: &[String]) -> Result<(), ProbeError> {
    Ok(())
}

fn check_cflags(ctx: &mut ProbeContext, _: &[String]) -> Result<(), ProbeError> {
    check_toolchain(ctx, Dialect::C)
}

fn check_cxx(_: &mut ProbeContext, _: &[String]) -> Result<(), ProbeError> {
    Ok(())
}

fn check_cxxflags(ctx: &mut ProbeContext, _: &[String]) -> Result<(), ProbeError> {
    check_toolchain(ctx, Dialect::Cxx)
}

/// Linker options.
pub fn link() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::new(
            "LDFLAGS",
            &[],
            check_ldflags,
            "linker flags, e.g. -L<lib dir> if you have libraries in a nonstandard directory <lib dir>",
        ),
        OptionDescriptor::new(
            "LIBS",
            &[],
            check_libs,
            "libraries to pass to the linker, e.g. -l<library>",
        ),
    ]
}

/// Preprocessor options.
pub fn preprocess() -> Vec<OptionDescriptor> {
    vec![OptionDescriptor::new(
        "CPPFLAGS",
        &[],
        check_cppflags,
        "C/C++/Objective C preprocessor flags, e.g. -I<include dir> if you have headers in a nonstandard directory <include dir>",
    )]
}

/// C compiler options, including the linker and preprocessor options it depends on.
pub fn c() -> Vec<OptionDescriptor> {
    union([
        link(),
        preprocess(),
        vec![
            OptionDescriptor::new("CC", &["gcc"], check_cc, "C compiler command"),
            OptionDescriptor::new("CFLAGS", &[], check_cflags, "C compiler flags"),
        ],
    ])
}

/// C++ compiler options, including the linker and preprocessor options it depends on.
pub fn cxx() -> Vec<OptionDescriptor> {
    union([
        link(),
        preprocess(),
        vec![
            OptionDescriptor::new("CXX", &["g++"], check_cxx, "C++ compiler command"),
            OptionDescriptor::new("CXXFLAGS", &[], check_cxxflags, "C++ compiler flags"),
        ],
    ])
}

/// Concatenates modules, keeping the first descriptor for each name.
pub fn union(modules: impl IntoIterator<Item = Vec<OptionDescriptor>>) -> Vec<OptionDescriptor> {
    let mut registry = Registry::new();
    for module in modules {
        registry.extend(module);
    }
    registry.options
}

/// Flat, ordered set of option descriptors.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    options: Vec<OptionDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the options needed to probe every dialect in `dialects`.
    pub fn for_dialects(dialects: &[Dialect]) -> Self {
        Self {
            options: union(dialects.iter().map(|d| match d {
                Dialect::C => c(),
                Dialect::Cxx => cxx(),
            })),
        }
    }

    /// Adds `option` unless one with the same name is already registered.
    /// Returns whether it was added.
    pub fn register(&mut self, option: OptionDescriptor) -> bool {
        if self.get(option.name).is_some() {
            return false;
        }
        self.options.push(option);
        true
    }

    pub fn extend(&mut self, options: impl IntoIterator<Item = OptionDescriptor>) {
        for option in options {
            self.register(option);
        }
    }

    pub fn get(&self, name: &str) -> Option<&OptionDescriptor> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.options.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.options.iter().map(|o| o.name).collect()
    }

    pub fn finalize(
        &self,
        ctx: &mut ProbeContext,
        values: &BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        self.finalize_with(ctx, values, |_| {})
    }

    /// Parses, stores and checks every option, calling `on_checked` after each one passes.
    ///
    /// `values` holds user-supplied text by option name; options not present
    /// take their defaults. Unknown names are rejected before anything runs.
    pub fn finalize_with(
        &self,
        ctx: &mut ProbeContext,
        values: &BTreeMap<String, String>,
        mut on_checked: impl FnMut(&OptionDescriptor),
    ) -> Result<(), ConfigError> {
        if let Some(unknown) = values.keys().find(|k| self.get(k).is_none()) {
            return Err(ConfigError::UnknownOption(unknown.clone()));
        }

        for option in &self.options {
            let tokens = match values.get(option.name) {
                Some(text) => (option.parse)(text).ok_or_else(|| ConfigError::Parse {
                    option: option.name.to_string(),
                    text: text.clone(),
                })?,
                None => option.init.clone(),
            };
            debug!(option = option.name, value = %join(&tokens), "checking");

            ctx.vars.set(option.name, tokens.clone());
            (option.check)(ctx, &tokens).map_err(|source| ConfigError::Check {
                option: option.name.to_string(),
                source,
            })?;
            on_checked(option);
        }
        Ok(())
    }
}
