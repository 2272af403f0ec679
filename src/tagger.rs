/// Keywords in title, case-sensitive, in the order of `keywords`.
pub fn tag<S: AsRef<str>>(title: &str, keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| -> &str { keyword.as_ref() })
        .filter(|keyword| !keyword.is_empty() && title.contains(keyword))
        .map(str::to_string)
        .collect()
}

/// The ordered keyword catalog used to tag articles.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Keywords(Vec<String>);

impl Keywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.into();
            if !keyword.is_empty() && !list.contains(&keyword) {
                list.push(keyword);
            }
        }
        Self(list)
    }

    pub fn tag(&self, title: &str) -> Vec<String> {
        tag(title, &self.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Keywords {
    fn from(keywords: Vec<String>) -> Self {
        Self::new(keywords)
    }
}

impl From<Keywords> for Vec<String> {
    fn from(keywords: Keywords) -> Self {
        keywords.0
    }
}
