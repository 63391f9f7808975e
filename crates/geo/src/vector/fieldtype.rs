use crate::{Error, Result, vector::dataframe::Field};
use num::NumCast;

fn parse_number<T: std::str::FromStr>(val: &str) -> Result<Option<T>> {
    val.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::InvalidNumber(format!("'{val}' is not a valid {}", std::any::type_name::<T>())))
}

pub trait VectorFieldType: Sized {
    const EMPTY_FIELD_IS_VALID: bool;

    /// Unparsable values are an error, they are never reported as missing
    fn read_from_field(field: &Field) -> Result<Option<Self>>;
}

impl VectorFieldType for f64 {
    const EMPTY_FIELD_IS_VALID: bool = false;

    fn read_from_field(field: &Field) -> Result<Option<Self>> {
        match field {
            Field::Float(val) => Ok(Some(*val)),
            Field::Integer(val) => Ok(NumCast::from(*val)),
            Field::String(val) => parse_number(val),
            Field::Boolean(val) => Err(Error::InvalidNumber(format!("Boolean value '{val}' is not a number"))),
        }
    }
}
