//! Request description: methods, query parameters, bodies and options.
//!
//! - [`RequestOptions`] caller-facing configuration (static values or functions of the context)
//! - [`RequestDescriptor`] resolved shape for one generation, plus eligibility
//! - [`Method`], [`Param`] / [`UrlParams`], [`Body`], [`ExtraOptions`]

mod descriptor;
mod method;
mod options;
mod params;

pub use descriptor::{Body, ExtraOptions, Headers, RequestDescriptor};
pub use method::Method;
pub use options::{Field, RequestOptions};
pub use params::{Param, UrlParams, prepare_url_params};
