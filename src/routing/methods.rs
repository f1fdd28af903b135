//! HTTP method mask.
//!
//! # Responsibilities
//! - Represent the set of methods a binding accepts
//! - Convert request methods and config strings into mask bits
//!
//! # Design Decisions
//! - Bit order is fixed (GET = 1) so masks are stable across builds
//! - Unknown methods map to the empty mask and never satisfy a binding

use axum::http::Method;
use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Set of HTTP methods accepted by a binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodMask: u16 {
        const GET = 1;
        const POST = 1 << 1;
        const PUT = 1 << 2;
        const PATCH = 1 << 3;
        const DELETE = 1 << 4;
        const COPY = 1 << 5;
        const HEAD = 1 << 6;
        const OPTIONS = 1 << 7;
        const LINK = 1 << 8;
        const UNLINK = 1 << 9;
        const PURGE = 1 << 10;
    }
}

impl MethodMask {
    /// Mask bit for a request method. Unsupported methods yield the empty mask.
    pub fn from_method(method: &Method) -> Self {
        method.as_str().parse().unwrap_or(MethodMask::empty())
    }

    /// Whether a request with `method` satisfies this mask.
    pub fn allows(&self, method: &Method) -> bool {
        let bit = Self::from_method(method);
        !bit.is_empty() && self.contains(bit)
    }
}

/// Error returned when a method name is not part of the mask.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method `{0}`")]
pub struct UnknownMethod(pub String);

impl FromStr for MethodMask {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "*" || upper == "ALL" {
            return Ok(MethodMask::all());
        }
        MethodMask::from_name(&upper).ok_or(UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for MethodMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

/// Parse a list of method names (as found in config) into one mask.
pub fn parse_methods<I, S>(names: I) -> Result<MethodMask, UnknownMethod>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .try_fold(MethodMask::empty(), |mask, name| {
            Ok(mask | name.as_ref().parse::<MethodMask>()?)
        })
}
