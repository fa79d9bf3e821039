use crate::locale::Locales;
use crate::types::{RedirectDetails, Rule};

/// Turns spreadsheet paths into the absolute URLs the rules list API wants.
#[derive(Clone, Debug)]
pub struct UrlExpander {
    /// Without a trailing slash, e.g. `https://www.example.com`.
    default_domain: String,
    locales: Locales,
}

impl UrlExpander {
    pub fn new(default_domain: &str, locales: Locales) -> Self {
        Self {
            default_domain: default_domain.trim_end_matches('/').to_string(),
            locales,
        }
    }

    pub fn default_domain(&self) -> &str {
        &self.default_domain
    }

    pub fn locales(&self) -> &Locales {
        &self.locales
    }

    /// Resolves `path` against the default domain, optionally under a locale
    /// path segment.
    ///
    /// Anything that already carries a scheme (`https:`, `mailto:`, `tel:`,
    /// ...) is returned untouched, locale or not.
    pub fn make_full_url(&self, path: &str, locale: Option<&str>) -> String {
        if has_scheme(path) {
            return path.to_string();
        }

        let path = path.strip_prefix('/').unwrap_or(path);
        match locale {
            Some(locale) => format!("{}/{}/{}", self.default_domain, locale, path),
            None => format!("{}/{}", self.default_domain, path),
        }
    }

    /// Fans a rule out into its redirects. The unprefixed redirect always
    /// comes first; localized rules add one per non-default locale.
    pub fn expand_rule(&self, rule: &Rule) -> Vec<RedirectDetails> {
        let mut redirects = vec![RedirectDetails {
            source_url: self.make_full_url(&rule.source, None),
            target_url: self.make_full_url(&rule.destination, None),
            status_code: rule.code,
        }];

        if rule.localized {
            redirects.extend(self.locales.prefixed().map(|locale| RedirectDetails {
                source_url: self.make_full_url(&rule.source, Some(locale)),
                target_url: self.make_full_url(&rule.destination, Some(locale)),
                status_code: rule.code,
            }));
        }

        redirects
    }
}

/// `scheme ":"` where the scheme is an ASCII letter followed by letters,
/// digits, `+`, `-` or `.`. The rest of the URL is not checked.
fn has_scheme(path: &str) -> bool {
    let Some((scheme, _)) = path.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
