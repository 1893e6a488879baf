/// Arguments substituted into a record's message template.
///
/// Positional arguments fill `{}` placeholders in order; named arguments fill
/// `{key}` placeholders. Placeholders without a matching argument are left in
/// place rather than dropped, so a mis-templated message still shows up in
/// the logs in a recognizable form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MessageArgs {
    #[default]
    None,
    Positional(Vec<String>),
    Named(Vec<(String, String)>),
}

impl MessageArgs {
    pub fn positional<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Positional(args.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Positional(args) => args.is_empty(),
            Self::Named(pairs) => pairs.is_empty(),
        }
    }

    /// Apply the arguments to a message template.
    pub fn fill(&self, template: &str) -> String {
        match self {
            Self::None => template.to_string(),
            Self::Positional(args) => {
                let mut out = String::with_capacity(template.len());
                let mut rest = template;
                let mut values = args.iter();
                while let Some(pos) = rest.find("{}") {
                    out.push_str(&rest[..pos]);
                    match values.next() {
                        Some(value) => out.push_str(value),
                        None => out.push_str("{}"),
                    }
                    rest = &rest[pos + 2..];
                }
                out.push_str(rest);
                out
            }
            Self::Named(pairs) => {
                let mut out = template.to_string();
                for (key, value) in pairs {
                    out = out.replace(&format!("{{{key}}}"), value);
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_returns_template_verbatim() {
        assert_eq!(MessageArgs::None.fill("plain {} text"), "plain {} text");
    }

    #[test]
    fn positional_fills_in_order() {
        let args = MessageArgs::positional(["a", "b"]);
        assert_eq!(args.fill("x={} y={}"), "x=a y=b");
    }

    #[test]
    fn surplus_placeholders_are_kept() {
        let args = MessageArgs::positional(["only"]);
        assert_eq!(args.fill("{} and {}"), "only and {}");
    }

    #[test]
    fn named_fills_by_key() {
        let args = MessageArgs::named([("host", "db1"), ("port", "5432")]);
        assert_eq!(args.fill("{host}:{port}"), "db1:5432");
    }

    #[test]
    fn named_ignores_unknown_keys() {
        let args = MessageArgs::named([("a", "1")]);
        assert_eq!(args.fill("{a} {missing}"), "1 {missing}");
    }
}
