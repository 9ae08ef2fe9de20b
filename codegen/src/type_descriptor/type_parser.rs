//! Parser for type signatures with support for nested generics and arrays
//!
//! This module uses nom to parse signatures like:
//! - `int`
//! - `com.acme.Item[]`
//! - `java.util.List<com.acme.Item>`
//! - `java.util.Map<java.lang.String, java.util.List<? extends com.acme.Item>>[][]`
//!
//! Bare names are parsed as class references; the type index rewrites the ones that
//! name declared type parameters into type variables.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{all_consuming, opt, recognize};
use nom::multi::{many0_count, separated_list1};
use nom::sequence::{delimited, pair, preceded};
use nom::{IResult, Parser};

use super::{ClassName, PrimitiveType, TypeDescriptor};
use crate::error::Error;

/// Parse an identifier segment (alphanumeric, `_` and `$`)
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '$').parse(input)
}

/// Parse a dotted name such as `java.util.List`
fn qualified_name(input: &str) -> IResult<&str, &str> {
    recognize(separated_list1(char('.'), identifier)).parse(input)
}

/// Parse `<A, B<C>>`
fn type_arguments(input: &str) -> IResult<&str, Vec<TypeDescriptor>> {
    delimited(
        pair(char('<'), multispace0),
        separated_list1(
            delimited(multispace0, char(','), multispace0),
            type_signature,
        ),
        pair(multispace0, char('>')),
    )
    .parse(input)
}

/// Parse `?`, `? extends X` or `? super X`; bounds are not retained
fn wildcard(input: &str) -> IResult<&str, TypeDescriptor> {
    let (input, _) = char('?').parse(input)?;
    let (input, _) = opt(preceded(
        delimited(
            multispace1,
            alt((tag("extends"), tag("super"))),
            multispace1,
        ),
        type_signature,
    ))
    .parse(input)?;
    Ok((input, TypeDescriptor::Wildcard))
}

fn class_or_primitive(input: &str) -> IResult<&str, TypeDescriptor> {
    let (input, name) = qualified_name(input)?;
    let (input, arguments) = opt(preceded(multispace0, type_arguments)).parse(input)?;

    let descriptor = match arguments {
        Some(arguments) => TypeDescriptor::Parameterized {
            raw: ClassName::from(name),
            arguments,
        },
        None => name.parse::<PrimitiveType>().map_or_else(
            |_| TypeDescriptor::Class(ClassName::from(name)),
            TypeDescriptor::Primitive,
        ),
    };
    Ok((input, descriptor))
}

/// Count trailing `[]` pairs
fn array_dimensions(input: &str) -> IResult<&str, usize> {
    many0_count(pair(multispace0, tag("[]"))).parse(input)
}

fn type_signature(input: &str) -> IResult<&str, TypeDescriptor> {
    let (input, base) = alt((wildcard, class_or_primitive)).parse(input)?;
    let (input, dimensions) = array_dimensions(input)?;
    let descriptor = (0..dimensions).fold(base, |component, _| {
        TypeDescriptor::Array(Box::new(component))
    });
    Ok((input, descriptor))
}

/// Parse a complete type signature, rejecting trailing input
///
/// # Errors
///
/// Returns [`Error::InvalidTypeSignature`] for malformed or trailing input.
pub fn parse_type_signature(signature: &str) -> Result<TypeDescriptor, Error> {
    all_consuming(delimited(multispace0, type_signature, multispace0))
        .parse(signature)
        .map(|(_, descriptor)| descriptor)
        .map_err(|e| Error::InvalidTypeSignature {
            signature: signature.to_string(),
            reason:    e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_and_class() {
        assert_eq!(
            parse_type_signature("long").ok(),
            Some(TypeDescriptor::Primitive(PrimitiveType::Long))
        );
        assert_eq!(
            parse_type_signature("com.acme.Outer$Inner").ok(),
            Some(TypeDescriptor::class("com.acme.Outer$Inner"))
        );
    }

    #[test]
    fn test_parse_nested_generics_and_arrays() {
        let parsed =
            parse_type_signature("java.util.Map<java.lang.String, java.util.List<com.acme.Item[]>>[]");
        let expected = TypeDescriptor::array_of(TypeDescriptor::parameterized(
            "java.util.Map",
            vec![
                TypeDescriptor::class("java.lang.String"),
                TypeDescriptor::parameterized("java.util.List", vec![TypeDescriptor::array_of(
                    TypeDescriptor::class("com.acme.Item"),
                )]),
            ],
        ));
        assert_eq!(parsed.ok(), Some(expected));
    }

    #[test]
    fn test_parse_wildcards() {
        let parsed = parse_type_signature("java.util.List<? extends com.acme.Item>");
        assert_eq!(
            parsed.ok(),
            Some(TypeDescriptor::parameterized("java.util.List", vec![
                TypeDescriptor::Wildcard
            ]))
        );
    }

    #[test]
    fn test_display_round_trips_signature() {
        let signature = "java.util.Map<java.lang.String, int[]>";
        let parsed = parse_type_signature(signature).map(|d| d.to_string());
        assert_eq!(parsed.ok().as_deref(), Some(signature));
    }

    #[test]
    fn test_reject_malformed() {
        assert!(parse_type_signature("java.util.List<").is_err());
        assert!(parse_type_signature("com.acme.Item extra").is_err());
        assert!(parse_type_signature("").is_err());
    }
}
