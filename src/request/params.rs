//! Query parameters and their URL encoding.

use std::collections::BTreeMap;

/// A single query parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Rendered as the items joined by `,`.
    List(Vec<String>),
    /// Skipped when encoding.
    Null,
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Str(v.to_owned())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Str(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(i64::from(v))
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Param::Null)
    }
}

impl From<Vec<String>> for Param {
    fn from(v: Vec<String>) -> Self {
        Param::List(v)
    }
}

impl From<Vec<&str>> for Param {
    fn from(v: Vec<&str>) -> Self {
        Param::List(v.into_iter().map(str::to_owned).collect())
    }
}

impl Param {
    fn render(&self) -> Option<String> {
        match self {
            Param::Str(s) => Some(s.clone()),
            Param::Int(i) => Some(i.to_string()),
            Param::Float(f) => Some(f.to_string()),
            Param::Bool(b) => Some(b.to_string()),
            Param::List(items) => Some(items.join(",")),
            Param::Null => None,
        }
    }
}

/// Ordered query map (keys are encoded in sorted order).
pub type UrlParams = BTreeMap<String, Param>;

/// Encodes `params` as `k=v&k2=v2`, skipping [`Param::Null`] entries.
///
/// # Example
/// ```
/// use reqvisor::{Param, UrlParams, prepare_url_params};
///
/// let mut q = UrlParams::new();
/// q.insert("year".into(), Param::from(2008));
/// q.insert("ci".into(), Param::from("IDMC WS"));
/// q.insert("skip".into(), Param::Null);
/// assert_eq!(prepare_url_params(&q), "ci=IDMC%20WS&year=2008");
/// ```
pub fn prepare_url_params(params: &UrlParams) -> String {
    params
        .iter()
        .filter_map(|(k, v)| {
            v.render()
                .map(|val| format!("{}={}", urlencoding::encode(k), urlencoding::encode(&val)))
        })
        .collect::<Vec<_>>()
        .join("&")
}
