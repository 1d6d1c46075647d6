// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete element kinds.
//!
//! Each kind holds only its own attributes and child handles; everything
//! shared lives in the element's [`crate::base::SedBase`]. The helpers here
//! give attribute reads uniform messages.

mod data_generator;
mod model;
mod output;
mod root;
mod simulation;
mod task;

pub use data_generator::{DataGenerator, Parameter, Variable};
pub use model::{ChangeAttribute, Model};
pub use output::{DataSet, Report};
pub use root::DocumentElement;
pub use simulation::{Algorithm, UniformTimeCourse};
pub use task::Task;

use std::str::FromStr;

use crate::error::{OpResult, OperationError, SedErrorCode};
use crate::object::ReadContext;
use crate::ser::{self, XmlOutputStream};
use crate::token::XmlAttributes;

fn log_missing(ctx: &mut ReadContext, code: SedErrorCode, attr: &str, element: &str) {
    ctx.log_error(
        code,
        &format!("Sedml attribute '{}' is missing from the <{}> element.", attr, element),
    );
}

/// Reads a string attribute. An empty value is logged and treated as unset.
fn read_string(
    ctx: &mut ReadContext,
    attributes: &XmlAttributes,
    attr: &str,
    element: &str,
) -> Option<String> {
    let v = attributes.value(attr)?;
    if v.is_empty() {
        ctx.log_error(
            SedErrorCode::SedNotSchemaConformant,
            &format!("Attribute '{}' on an <{}> must not be an empty string.", attr, element),
        );
        return None;
    }
    Some(v.to_owned())
}

/// Reads a required string attribute, logging `missing` if it is absent.
fn read_required_string(
    ctx: &mut ReadContext,
    attributes: &XmlAttributes,
    attr: &str,
    element: &str,
    missing: SedErrorCode,
) -> Option<String> {
    if attributes.value(attr).is_none() {
        log_missing(ctx, missing, attr, element);
        return None;
    }
    read_string(ctx, attributes, attr, element)
}

/// Reads a numeric attribute; `kind` names the type in the message, e.g. "a double".
fn read_number<T: FromStr>(
    ctx: &mut ReadContext,
    attributes: &XmlAttributes,
    attr: &str,
    element: &str,
    kind: &str,
    bad_value: SedErrorCode,
) -> Option<T> {
    let v = attributes.value(attr)?;
    match v.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            ctx.log_error(
                bad_value,
                &format!(
                    "Sedml attribute '{}' from the <{}> element must be {}.",
                    attr, element, kind
                ),
            );
            None
        }
    }
}

fn read_double(
    ctx: &mut ReadContext,
    attributes: &XmlAttributes,
    attr: &str,
    element: &str,
    bad_value: SedErrorCode,
) -> Option<f64> {
    read_number(ctx, attributes, attr, element, "a double", bad_value)
}

fn read_integer(
    ctx: &mut ReadContext,
    attributes: &XmlAttributes,
    attr: &str,
    element: &str,
    bad_value: SedErrorCode,
) -> Option<i64> {
    read_number(ctx, attributes, attr, element, "an integer", bad_value)
}

fn write_string(stream: &mut XmlOutputStream, attr: &str, value: &Option<String>) -> Result<(), ser::Error> {
    match value {
        Some(v) => stream.write_attribute(attr, "", v),
        None => Ok(()),
    }
}

fn write_number<T: ToString>(stream: &mut XmlOutputStream, attr: &str, value: Option<T>) -> Result<(), ser::Error> {
    match value {
        Some(v) => stream.write_attribute(attr, "", &v.to_string()),
        None => Ok(()),
    }
}

/// Assigns a string attribute from the generic setter. Empty clears.
fn assign_string(field: &mut Option<String>, value: &str) -> OpResult {
    *field = if value.is_empty() { None } else { Some(value.to_owned()) };
    Ok(())
}

fn assign_number<T: FromStr>(field: &mut Option<T>, value: &str) -> OpResult {
    if value.is_empty() {
        *field = None;
        return Ok(());
    }
    let n = value
        .trim()
        .parse()
        .map_err(|_| OperationError::InvalidAttributeValue)?;
    *field = Some(n);
    Ok(())
}

fn unset<T>(field: &mut Option<T>) -> OpResult {
    *field = None;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn assign() {
        let mut s = None;
        assign_string(&mut s, "x").unwrap();
        assert_eq!(s.as_deref(), Some("x"));
        assign_string(&mut s, "").unwrap();
        assert_eq!(s, None);

        let mut n: Option<f64> = None;
        assign_number(&mut n, " 1.5").unwrap();
        assert_eq!(n, Some(1.5));
        assert_matches!(assign_number(&mut n, "abc"), Err(OperationError::InvalidAttributeValue));
        assert_eq!(n, Some(1.5));
    }
}
