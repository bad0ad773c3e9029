use crate::contract::TypeRef;
use crate::definition::{DecoderKind, ParameterDecoderType};

/// Both `decoder` and `list_decoder` were set on a path directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictingPathDecoders;

/// Build the decoder description for a path/query/header parameter.
///
/// No explicit decoder means `None`: generated code falls back to the
/// `FromStr` based default for the parameter type.
#[must_use]
pub fn select_decoder(
    explicit: Option<TypeRef>,
    kind: DecoderKind,
    field_name: &str,
) -> Option<ParameterDecoderType> {
    explicit.map(|decoder_type| ParameterDecoderType {
        kind,
        decoder_type,
        field_name: field_name.to_string(),
        decode_method: kind.decode_method(),
    })
}

/// Pick the explicit decoder written on a path directive, if any.
///
/// `decoder` selects a single-value decoder, `list_decoder` a collection
/// decoder; setting both is rejected.
pub fn path_decoder<'a>(
    decoder: Option<&'a str>,
    list_decoder: Option<&'a str>,
) -> Result<Option<(&'a str, DecoderKind)>, ConflictingPathDecoders> {
    match (decoder, list_decoder) {
        (Some(_), Some(_)) => Err(ConflictingPathDecoders),
        (Some(single), None) => Ok(Some((single, DecoderKind::Param))),
        (None, Some(list)) => Ok(Some((list, DecoderKind::List))),
        (None, None) => Ok(None),
    }
}
