//! Command templates.
//!
//! Every VCS invocation is described by a template such as
//! `"$svn --non-interactive proplist $file_name"`. Variables are replaced by
//! [`Substitution::apply`]; values defined with [`Substitution::arg`] are
//! quoted so the shell sees each one as a single argument.

use std::collections::BTreeMap;

/// Quote `value` so the shell passes it through as one argument.
pub fn prep_arg(value: &str) -> String {
    match shlex::try_quote(value) {
        Ok(quoted) => quoted.into_owned(),
        // Only a NUL byte cannot be quoted, and no argument can carry one.
        Err(_) => prep_arg(&value.replace('\0', "")),
    }
}

/// `-r REV` for a pinned revision, empty otherwise.
pub fn rev_option(revision: Option<&str>) -> String {
    match revision {
        Some(rev) if !rev.is_empty() => format!("-r {}", prep_arg(rev)),
        _ => String::new(),
    }
}

/// A set of `$name` variables to substitute into a template.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    vars: BTreeMap<String, String>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a variable whose value is inserted verbatim.
    pub fn raw(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    /// Define a variable whose value is quoted as a single shell argument.
    pub fn arg(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), prep_arg(value));
        self
    }

    /// Define a variable holding several arguments, each quoted.
    pub fn args<'a>(mut self, name: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let values: Vec<&str> = values.into_iter().collect();
        let joined = shlex::try_join(values.iter().copied()).unwrap_or_else(|_| {
            values
                .iter()
                .map(|v| prep_arg(v))
                .collect::<Vec<_>>()
                .join(" ")
        });
        self.vars.insert(name.to_string(), joined);
        self
    }

    /// Replace every `$name` in `template`. Unknown variables are left as-is.
    pub fn apply(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }

            let start = i + 1;
            let mut end = start;
            while let Some(&(j, n)) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    end = j + n.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }

            let name = &template[start..end];
            match self.vars.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
        }

        out
    }
}
