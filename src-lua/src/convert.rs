//! Lua Value Conversion
//!
//! Argument validation and record marshalling. Lua values are only touched
//! here; everything past this boundary works on typed structs.

use mlua::{Error as LuaError, Lua, LuaSerdeExt, Result as LuaResult, Table, Value};
use pulse_mixer::{Sink, SinkInput, VolumeRequest};

/// Position of a positional argument, used in error messages
#[derive(Debug, Clone, Copy)]
pub enum Arg {
    First,
    Second,
    /// The only argument of a one-argument function
    Only,
}

impl Arg {
    fn describe(&self) -> &'static str {
        match self {
            Arg::First => "first argument",
            Arg::Second => "second argument",
            Arg::Only => "argument",
        }
    }
}

fn argument_error(arg: Arg, expected: &str) -> LuaError {
    LuaError::RuntimeError(format!("{} should be {}", arg.describe(), expected))
}

/// Parse a numeric string the way Lua coerces strings to numbers
///
/// Accepts surrounding whitespace, decimal integers and floats, and hex
/// integers. The `inf`/`nan` spellings Rust would accept are not numbers
/// to Lua.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let value = i64::from_str_radix(hex, 16).ok()? as f64;
        return Some(if negative { -value } else { value });
    }

    let is_decimal = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !is_decimal {
        return None;
    }
    text.parse().ok()
}

/// Read a number, coercing numeric strings
fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Number(n) => Some(*n),
        Value::String(s) => s.to_str().ok().and_then(|s| parse_number(&s)),
        _ => None,
    }
}

/// Read a sink or sink input index
///
/// Floats are truncated toward zero and numeric strings are coerced;
/// negative or out-of-range values are rejected.
pub fn index_arg(value: &Value, arg: Arg) -> LuaResult<u32> {
    if let Value::Integer(i) = value {
        return u32::try_from(*i).map_err(|_| argument_error(arg, "a valid index"));
    }

    let number = number_value(value).ok_or_else(|| argument_error(arg, "number"))?;
    let truncated = number.trunc();
    if number.is_finite() && truncated >= 0.0 && truncated <= u32::MAX as f64 {
        Ok(truncated as u32)
    } else {
        Err(argument_error(arg, "a valid index"))
    }
}

/// Read a volume/mute request table
///
/// `mute` must be a boolean and `volume` a number when present; absent
/// fields stay `None`.
pub fn volume_request_arg(value: &Value, arg: Arg) -> LuaResult<VolumeRequest> {
    let table = match value {
        Value::Table(table) => table,
        _ => return Err(argument_error(arg, "table")),
    };

    let mute = match table.raw_get::<Value>("mute")? {
        Value::Nil => None,
        Value::Boolean(mute) => Some(mute),
        _ => return Err(field_error("mute", "boolean")),
    };

    let volume = match table.raw_get::<Value>("volume")? {
        Value::Nil => None,
        other => match number_value(&other) {
            Some(v) if !v.is_nan() => Some(v),
            _ => return Err(field_error("volume", "number")),
        },
    };

    Ok(VolumeRequest { mute, volume })
}

fn field_error(field: &str, expected: &str) -> LuaError {
    LuaError::RuntimeError(format!("field '{}' should be {}", field, expected))
}

/// Read a sink name
///
/// Sink names cannot carry NUL bytes, so those are rejected here.
pub fn name_arg(value: &Value, arg: Arg) -> LuaResult<String> {
    let name = match value {
        Value::String(s) => s.to_str()?.to_string(),
        // Numbers are strings to Lua's string functions
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(argument_error(arg, "a string")),
    };
    if name.contains('\0') {
        return Err(argument_error(arg, "a string without NUL bytes"));
    }
    Ok(name)
}

/// Build the sink table, addressable by index and by name
///
/// Each key gets its own copy of the record.
pub fn sinks_table(lua: &Lua, sinks: &[Sink]) -> LuaResult<Table> {
    let table = lua.create_table()?;
    for sink in sinks {
        table.raw_set(sink.index, lua.to_value(sink)?)?;
        table.raw_set(sink.name.as_str(), lua.to_value(sink)?)?;
    }
    Ok(table)
}

/// Build the sink input table, addressable by index
pub fn sink_inputs_table(lua: &Lua, inputs: &[SinkInput]) -> LuaResult<Table> {
    let table = lua.create_table()?;
    for input in inputs {
        table.raw_set(input.index, lua.to_value(input)?)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_arg() {
        assert_eq!(index_arg(&Value::Integer(3), Arg::First).unwrap(), 3);
        assert_eq!(index_arg(&Value::Number(2.9), Arg::First).unwrap(), 2);
        assert!(index_arg(&Value::Integer(-1), Arg::First).is_err());
        assert!(index_arg(&Value::Number(f64::NAN), Arg::First).is_err());

        let err = index_arg(&Value::Nil, Arg::Second).unwrap_err();
        assert!(err.to_string().contains("second argument should be number"));
    }

    #[test]
    fn test_index_arg_numeric_strings() {
        let lua = Lua::new();
        let text = |s: &str| Value::String(lua.create_string(s).unwrap());

        assert_eq!(index_arg(&text("3"), Arg::First).unwrap(), 3);
        assert_eq!(index_arg(&text(" 7.8 "), Arg::First).unwrap(), 7);
        assert_eq!(index_arg(&text("0x10"), Arg::First).unwrap(), 16);
        assert!(index_arg(&text("-2"), Arg::First)
            .unwrap_err()
            .to_string()
            .contains("should be a valid index"));
        for bad in ["sink", "inf", "nan", ""] {
            let err = index_arg(&text(bad), Arg::First).unwrap_err();
            assert!(err.to_string().contains("first argument should be number"), "{:?}", bad);
        }
    }

    #[test]
    fn test_volume_request_fields() {
        let lua = Lua::new();
        let table = lua.create_table().unwrap();
        table.set("mute", true).unwrap();
        table.set("volume", 150).unwrap();

        let request = volume_request_arg(&Value::Table(table), Arg::Second).unwrap();
        assert_eq!(request.mute, Some(true));
        assert_eq!(request.volume, Some(150.0));
    }

    #[test]
    fn test_volume_request_absent_fields() {
        let lua = Lua::new();
        let table = lua.create_table().unwrap();
        let request = volume_request_arg(&Value::Table(table), Arg::Second).unwrap();
        assert!(request.is_empty());
    }

    #[test]
    fn test_volume_request_wrong_field_type() {
        let lua = Lua::new();
        let table = lua.create_table().unwrap();
        table.set("mute", "yes").unwrap();
        let err = volume_request_arg(&Value::Table(table), Arg::Second).unwrap_err();
        assert!(err.to_string().contains("field 'mute' should be boolean"));

        let table = lua.create_table().unwrap();
        table.set("volume", f64::NAN).unwrap();
        let err = volume_request_arg(&Value::Table(table), Arg::Second).unwrap_err();
        assert!(err.to_string().contains("field 'volume' should be number"));
    }

    #[test]
    fn test_volume_request_not_a_table() {
        let err = volume_request_arg(&Value::Boolean(true), Arg::Second).unwrap_err();
        assert!(err.to_string().contains("second argument should be table"));
    }

    #[test]
    fn test_name_arg() {
        let lua = Lua::new();
        let name = lua.create_string("alsa_output.pci").unwrap();
        assert_eq!(name_arg(&Value::String(name), Arg::Only).unwrap(), "alsa_output.pci");

        let err = name_arg(&Value::Nil, Arg::Only).unwrap_err();
        assert!(err.to_string().contains("argument should be a string"));

        let name = lua.create_string(b"sink\0evil").unwrap();
        let err = name_arg(&Value::String(name), Arg::Only).unwrap_err();
        assert!(err
            .to_string()
            .contains("argument should be a string without NUL bytes"));
    }

    #[test]
    fn test_sinks_table_dual_keys() {
        let lua = Lua::new();
        let sinks = vec![Sink {
            index: 2,
            volume: 55,
            mute: false,
            name: "hdmi".to_string(),
            is_default: true,
        }];
        let table = sinks_table(&lua, &sinks).unwrap();

        let by_index: Table = table.get(2).unwrap();
        let by_name: Table = table.get("hdmi").unwrap();
        assert_eq!(by_index.get::<u32>("volume").unwrap(), 55);
        assert_eq!(by_name.get::<u32>("index").unwrap(), 2);
        assert!(by_name.get::<bool>("default").unwrap());
    }
}
