use hostsync_common::network::entry::Entry;

/// Expands short names into fully qualified names for every configured domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifier {
    domains: Vec<String>,
}

impl Qualifier {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains: Vec<String> = domains
            .into_iter()
            .map(|domain| domain.as_ref().trim().trim_matches('.').to_lowercase())
            .filter(|domain| !domain.is_empty())
            .collect();
        Self { domains }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Domain-major, name-minor: for `[d1, d2]` and `[n1, n2]` this yields
    /// `n1.d1, n2.d1, n1.d2, n2.d2`.
    pub fn qualify_names(&self, names: &[String]) -> Vec<String> {
        let mut qualified: Vec<String> = Vec::with_capacity(names.len() * self.domains.len());
        for domain in &self.domains {
            for name in names {
                qualified.push(format!("{}.{}", name.to_lowercase(), domain));
            }
        }
        qualified
    }

    /// Recomputes an entry's qualified names from its current names.
    pub fn qualify(&self, entry: &mut Entry) {
        let qualified: Vec<String> = self.qualify_names(entry.names());
        entry.set_qualified_names(qualified);
    }
}
