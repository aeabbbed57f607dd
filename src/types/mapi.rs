use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use uuid::Uuid;

use super::WireDateTime;
use crate::error::{DeserializationError, Error, Result};

/// The type of the value of a MAPI property.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/extendedfielduri#propertytype-attribute>
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum MapiPropertyType {
    ApplicationTime,
    ApplicationTimeArray,
    Binary,
    BinaryArray,
    Boolean,
    CLSID,
    CLSIDArray,
    Currency,
    CurrencyArray,
    Double,
    DoubleArray,
    Error,
    Float,
    FloatArray,
    Integer,
    IntegerArray,
    Long,
    LongArray,
    Null,
    Object,
    ObjectArray,
    Short,
    ShortArray,
    SystemTime,
    SystemTimeArray,
    String,
    StringArray,
}

impl MapiPropertyType {
    /// Every MAPI type, in schema order.
    pub const ALL: [MapiPropertyType; 27] = [
        MapiPropertyType::ApplicationTime,
        MapiPropertyType::ApplicationTimeArray,
        MapiPropertyType::Binary,
        MapiPropertyType::BinaryArray,
        MapiPropertyType::Boolean,
        MapiPropertyType::CLSID,
        MapiPropertyType::CLSIDArray,
        MapiPropertyType::Currency,
        MapiPropertyType::CurrencyArray,
        MapiPropertyType::Double,
        MapiPropertyType::DoubleArray,
        MapiPropertyType::Error,
        MapiPropertyType::Float,
        MapiPropertyType::FloatArray,
        MapiPropertyType::Integer,
        MapiPropertyType::IntegerArray,
        MapiPropertyType::Long,
        MapiPropertyType::LongArray,
        MapiPropertyType::Null,
        MapiPropertyType::Object,
        MapiPropertyType::ObjectArray,
        MapiPropertyType::Short,
        MapiPropertyType::ShortArray,
        MapiPropertyType::SystemTime,
        MapiPropertyType::SystemTimeArray,
        MapiPropertyType::String,
        MapiPropertyType::StringArray,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MapiPropertyType::ApplicationTime => "ApplicationTime",
            MapiPropertyType::ApplicationTimeArray => "ApplicationTimeArray",
            MapiPropertyType::Binary => "Binary",
            MapiPropertyType::BinaryArray => "BinaryArray",
            MapiPropertyType::Boolean => "Boolean",
            MapiPropertyType::CLSID => "CLSID",
            MapiPropertyType::CLSIDArray => "CLSIDArray",
            MapiPropertyType::Currency => "Currency",
            MapiPropertyType::CurrencyArray => "CurrencyArray",
            MapiPropertyType::Double => "Double",
            MapiPropertyType::DoubleArray => "DoubleArray",
            MapiPropertyType::Error => "Error",
            MapiPropertyType::Float => "Float",
            MapiPropertyType::FloatArray => "FloatArray",
            MapiPropertyType::Integer => "Integer",
            MapiPropertyType::IntegerArray => "IntegerArray",
            MapiPropertyType::Long => "Long",
            MapiPropertyType::LongArray => "LongArray",
            MapiPropertyType::Null => "Null",
            MapiPropertyType::Object => "Object",
            MapiPropertyType::ObjectArray => "ObjectArray",
            MapiPropertyType::Short => "Short",
            MapiPropertyType::ShortArray => "ShortArray",
            MapiPropertyType::SystemTime => "SystemTime",
            MapiPropertyType::SystemTimeArray => "SystemTimeArray",
            MapiPropertyType::String => "String",
            MapiPropertyType::StringArray => "StringArray",
        }
    }

    pub fn is_array(self) -> bool {
        MapiTypeConverter::entry(self).is_array
    }
}

impl fmt::Display for MapiPropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapiPropertyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MapiPropertyType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Deserialization(DeserializationError::new(s, "MapiPropertyType")))
    }
}

/// The storage kind of a MAPI value, i.e. which [`MapiValue`] variant holds it.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum MapiValueKind {
    Null,
    Boolean,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Binary,
    Clsid,
    DateTime,
    String,
    Array,
}

impl fmt::Display for MapiValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The in-memory value of a MAPI property.
#[derive(Clone, Debug, PartialEq)]
pub enum MapiValue {
    Null,
    Boolean(bool),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Binary(Vec<u8>),
    Clsid(Uuid),
    DateTime(WireDateTime),
    String(String),
    Array(Vec<MapiValue>),
}

impl MapiValue {
    pub fn kind(&self) -> MapiValueKind {
        match self {
            MapiValue::Null => MapiValueKind::Null,
            MapiValue::Boolean(_) => MapiValueKind::Boolean,
            MapiValue::Short(_) => MapiValueKind::Short,
            MapiValue::Integer(_) => MapiValueKind::Integer,
            MapiValue::Long(_) => MapiValueKind::Long,
            MapiValue::Float(_) => MapiValueKind::Float,
            MapiValue::Double(_) => MapiValueKind::Double,
            MapiValue::Binary(_) => MapiValueKind::Binary,
            MapiValue::Clsid(_) => MapiValueKind::Clsid,
            MapiValue::DateTime(_) => MapiValueKind::DateTime,
            MapiValue::String(_) => MapiValueKind::String,
            MapiValue::Array(_) => MapiValueKind::Array,
        }
    }

    /// The value's natural text, used when coercing between scalar kinds.
    fn natural_text(&self) -> Option<String> {
        Some(match self {
            MapiValue::Null | MapiValue::Array(_) => return None,
            MapiValue::Boolean(b) => format_bool(*b),
            MapiValue::Short(v) => v.to_string(),
            MapiValue::Integer(v) => v.to_string(),
            MapiValue::Long(v) => v.to_string(),
            MapiValue::Float(v) => v.to_string(),
            MapiValue::Double(v) => v.to_string(),
            MapiValue::Binary(v) => STANDARD.encode(v),
            MapiValue::Clsid(v) => v.to_string(),
            MapiValue::DateTime(v) => v.to_string(),
            MapiValue::String(v) => v.clone(),
        })
    }
}

macro_rules! mapi_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for MapiValue {
                fn from(v: $t) -> Self {
                    MapiValue::$variant(v.into())
                }
            }
        )*
    };
}

mapi_value_from! {
    bool => Boolean,
    i16 => Short,
    i32 => Integer,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<u8> => Binary,
    Uuid => Clsid,
    WireDateTime => DateTime,
    String => String,
    &str => String,
}

type Parser = fn(&str) -> std::result::Result<MapiValue, String>;
type Formatter = fn(&MapiValue) -> Option<String>;

/// How values of one [`MapiPropertyType`] are stored, parsed and formatted.
///
/// Array types share the parser and formatter of their scalar counterpart; those are applied to
/// each element in turn.
pub struct MapiTypeConverterMapEntry {
    kind: MapiValueKind,
    is_array: bool,
    parse: Parser,
    format: Formatter,
    default_value: MapiValue,
}

impl MapiTypeConverterMapEntry {
    fn scalar(kind: MapiValueKind, parse: Parser, format: Formatter, default_value: MapiValue) -> Self {
        MapiTypeConverterMapEntry {
            kind,
            is_array: false,
            parse,
            format,
            default_value,
        }
    }

    fn array_of(scalar: &MapiTypeConverterMapEntry) -> Self {
        MapiTypeConverterMapEntry {
            kind: scalar.kind,
            is_array: true,
            parse: scalar.parse,
            format: scalar.format,
            default_value: scalar.default_value.clone(),
        }
    }

    /// The storage kind of a value (of each element, for array types).
    pub fn kind(&self) -> MapiValueKind {
        self.kind
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// The value empty text converts to.
    pub fn default_value(&self) -> &MapiValue {
        &self.default_value
    }

    fn parse(&self, mapi_type: MapiPropertyType, text: &str) -> Result<MapiValue> {
        // only strings keep their surrounding whitespace
        let text = match self.kind {
            MapiValueKind::String => text,
            _ => text.trim(),
        };
        if text.is_empty() {
            return Ok(self.default_value.clone());
        }
        (self.parse)(text).map_err(|reason| {
            Error::Deserialization(DeserializationError::new(text, mapi_type.as_str()).because(reason))
        })
    }

    fn format(&self, mapi_type: MapiPropertyType, value: &MapiValue) -> Result<String> {
        if let MapiValue::Null = value {
            return Ok(String::new());
        }
        (self.format)(value).ok_or_else(|| {
            Error::Argument(format!(
                "a value of kind {} cannot be written as {}",
                value.kind(),
                mapi_type
            ))
        })
    }
}

fn format_bool(b: bool) -> String {
    if b { "true" } else { "false" }.to_string()
}

fn parse_boolean(s: &str) -> std::result::Result<MapiValue, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(MapiValue::Boolean(true)),
        "false" | "0" => Ok(MapiValue::Boolean(false)),
        _ => Err("not a boolean literal".to_string()),
    }
}

fn parse_short(s: &str) -> std::result::Result<MapiValue, String> {
    s.parse().map(MapiValue::Short).map_err(|e| e.to_string())
}

fn parse_integer(s: &str) -> std::result::Result<MapiValue, String> {
    s.parse().map(MapiValue::Integer).map_err(|e| e.to_string())
}

fn parse_long(s: &str) -> std::result::Result<MapiValue, String> {
    s.parse().map(MapiValue::Long).map_err(|e| e.to_string())
}

fn parse_float(s: &str) -> std::result::Result<MapiValue, String> {
    s.parse().map(MapiValue::Float).map_err(|e| e.to_string())
}

fn parse_double(s: &str) -> std::result::Result<MapiValue, String> {
    s.parse().map(MapiValue::Double).map_err(|e| e.to_string())
}

fn parse_binary(s: &str) -> std::result::Result<MapiValue, String> {
    STANDARD
        .decode(s)
        .map(MapiValue::Binary)
        .map_err(|e| e.to_string())
}

fn parse_clsid(s: &str) -> std::result::Result<MapiValue, String> {
    Uuid::parse_str(s)
        .map(MapiValue::Clsid)
        .map_err(|e| e.to_string())
}

fn parse_date_time(s: &str) -> std::result::Result<MapiValue, String> {
    WireDateTime::parse(s)
        .map(MapiValue::DateTime)
        .map_err(|e| e.to_string())
}

fn parse_string(s: &str) -> std::result::Result<MapiValue, String> {
    Ok(MapiValue::String(s.to_string()))
}

fn parse_null(_: &str) -> std::result::Result<MapiValue, String> {
    Ok(MapiValue::Null)
}

fn format_boolean(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::Boolean(b) => Some(format_bool(*b)),
        _ => None,
    }
}

fn format_short(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::Short(n) => Some(n.to_string()),
        _ => None,
    }
}

fn format_integer(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::Integer(n) => Some(n.to_string()),
        _ => None,
    }
}

fn format_long(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::Long(n) => Some(n.to_string()),
        _ => None,
    }
}

fn format_float(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::Float(n) => Some(n.to_string()),
        _ => None,
    }
}

fn format_double(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::Double(n) => Some(n.to_string()),
        _ => None,
    }
}

fn format_binary(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::Binary(bytes) => Some(STANDARD.encode(bytes)),
        _ => None,
    }
}

fn format_clsid(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::Clsid(guid) => Some(guid.to_string()),
        _ => None,
    }
}

fn format_date_time(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::DateTime(dt) => Some(dt.to_string()),
        _ => None,
    }
}

fn format_string(v: &MapiValue) -> Option<String> {
    match v {
        MapiValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn format_null(_: &MapiValue) -> Option<String> {
    Some(String::new())
}

lazy_static! {
    static ref MAPI_TYPE_CONVERTER_MAP: HashMap<MapiPropertyType, MapiTypeConverterMapEntry> = {
        use self::MapiPropertyType as T;
        use self::MapiValueKind as K;

        let boolean = MapiTypeConverterMapEntry::scalar(K::Boolean, parse_boolean, format_boolean, MapiValue::Boolean(false));
        let short = MapiTypeConverterMapEntry::scalar(K::Short, parse_short, format_short, MapiValue::Short(0));
        let integer = MapiTypeConverterMapEntry::scalar(K::Integer, parse_integer, format_integer, MapiValue::Integer(0));
        let long = MapiTypeConverterMapEntry::scalar(K::Long, parse_long, format_long, MapiValue::Long(0));
        let float = MapiTypeConverterMapEntry::scalar(K::Float, parse_float, format_float, MapiValue::Float(0.0));
        let double = MapiTypeConverterMapEntry::scalar(K::Double, parse_double, format_double, MapiValue::Double(0.0));
        let binary = MapiTypeConverterMapEntry::scalar(K::Binary, parse_binary, format_binary, MapiValue::Binary(Vec::new()));
        let clsid = MapiTypeConverterMapEntry::scalar(K::Clsid, parse_clsid, format_clsid, MapiValue::Clsid(Uuid::nil()));
        let system_time = MapiTypeConverterMapEntry::scalar(
            K::DateTime,
            parse_date_time,
            format_date_time,
            MapiValue::DateTime(WireDateTime::Unspecified(NaiveDateTime::default())),
        );
        let string = MapiTypeConverterMapEntry::scalar(K::String, parse_string, format_string, MapiValue::String(String::new()));

        let mut map = HashMap::new();
        // application time is an OLE automation date: days since 1899-12-30 as a double
        map.insert(T::ApplicationTimeArray, MapiTypeConverterMapEntry::array_of(&double));
        map.insert(T::ApplicationTime, MapiTypeConverterMapEntry::array_of(&double).scalar_copy());
        map.insert(T::BinaryArray, MapiTypeConverterMapEntry::array_of(&binary));
        map.insert(T::CLSIDArray, MapiTypeConverterMapEntry::array_of(&clsid));
        map.insert(T::CurrencyArray, MapiTypeConverterMapEntry::array_of(&long));
        map.insert(T::Currency, MapiTypeConverterMapEntry::array_of(&long).scalar_copy());
        map.insert(T::DoubleArray, MapiTypeConverterMapEntry::array_of(&double));
        map.insert(T::Error, MapiTypeConverterMapEntry::array_of(&integer).scalar_copy());
        map.insert(T::FloatArray, MapiTypeConverterMapEntry::array_of(&float));
        map.insert(T::IntegerArray, MapiTypeConverterMapEntry::array_of(&integer));
        map.insert(T::LongArray, MapiTypeConverterMapEntry::array_of(&long));
        map.insert(T::Null, MapiTypeConverterMapEntry::scalar(K::Null, parse_null, format_null, MapiValue::Null));
        map.insert(T::Object, MapiTypeConverterMapEntry::array_of(&string).scalar_copy());
        map.insert(T::ObjectArray, MapiTypeConverterMapEntry::array_of(&string));
        map.insert(T::ShortArray, MapiTypeConverterMapEntry::array_of(&short));
        map.insert(T::SystemTimeArray, MapiTypeConverterMapEntry::array_of(&system_time));
        map.insert(T::StringArray, MapiTypeConverterMapEntry::array_of(&string));
        map.insert(T::Boolean, boolean);
        map.insert(T::Short, short);
        map.insert(T::Integer, integer);
        map.insert(T::Long, long);
        map.insert(T::Float, float);
        map.insert(T::Double, double);
        map.insert(T::Binary, binary);
        map.insert(T::CLSID, clsid);
        map.insert(T::SystemTime, system_time);
        map.insert(T::String, string);
        map
    };
}

impl MapiTypeConverterMapEntry {
    fn scalar_copy(mut self) -> Self {
        self.is_array = false;
        self
    }
}

/// Converts MAPI property values to and from their wire text.
pub struct MapiTypeConverter;

impl MapiTypeConverter {
    /// The conversion entry for `mapi_type`. Every type has exactly one.
    pub fn entry(mapi_type: MapiPropertyType) -> &'static MapiTypeConverterMapEntry {
        // the map is built from an exhaustive list; a missing type is a programming error
        &MAPI_TYPE_CONVERTER_MAP[&mapi_type]
    }

    /// Parses one value's text. Empty text yields the type's default value.
    pub fn convert_to_value(mapi_type: MapiPropertyType, text: &str) -> Result<MapiValue> {
        Self::entry(mapi_type).parse(mapi_type, text)
    }

    /// Parses each element of an array value. Empty elements yield the type's default value
    /// without invoking the parser.
    pub fn convert_to_values<I, S>(mapi_type: MapiPropertyType, texts: I) -> Result<Vec<MapiValue>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = Self::entry(mapi_type);
        texts
            .into_iter()
            .map(|text| entry.parse(mapi_type, text.as_ref()))
            .collect()
    }

    /// Formats one value, or one element of an array value. `None` formats as the empty string.
    pub fn convert_to_string(mapi_type: MapiPropertyType, value: Option<&MapiValue>) -> Result<String> {
        match value {
            None => Ok(String::new()),
            Some(value) => Self::entry(mapi_type).format(mapi_type, value),
        }
    }

    /// Formats every element of an array value.
    pub fn convert_to_strings(mapi_type: MapiPropertyType, value: &MapiValue) -> Result<Vec<String>> {
        let entry = Self::entry(mapi_type);
        match value {
            MapiValue::Array(items) => items.iter().map(|v| entry.format(mapi_type, v)).collect(),
            other => Ok(vec![entry.format(mapi_type, other)?]),
        }
    }

    /// Coerces `value` into exactly the shape `mapi_type` requires before it is sent.
    ///
    /// Array types require a non-empty [`MapiValue::Array`] whose elements all already have the
    /// declared element kind. Scalar values of another kind are converted through their text
    /// when the target is an integer, boolean or date/time type.
    pub fn change_type(mapi_type: MapiPropertyType, value: MapiValue) -> Result<MapiValue> {
        let entry = Self::entry(mapi_type);

        if entry.is_array {
            return match value {
                MapiValue::Array(items) => {
                    if items.is_empty() {
                        return Err(Error::Argument(format!(
                            "a value of type {} must contain at least one element",
                            mapi_type
                        )));
                    }
                    if let Some(bad) = items.iter().find(|v| v.kind() != entry.kind) {
                        return Err(Error::Argument(format!(
                            "array element of kind {} does not match the element kind {} of {}",
                            bad.kind(),
                            entry.kind,
                            mapi_type
                        )));
                    }
                    Ok(MapiValue::Array(items))
                }
                other => Err(Error::Argument(format!(
                    "a value of kind {} cannot be converted to {}",
                    other.kind(),
                    mapi_type
                ))),
            };
        }

        if value.kind() == entry.kind {
            return Ok(value);
        }

        let convertible = matches!(
            entry.kind,
            MapiValueKind::Short
                | MapiValueKind::Integer
                | MapiValueKind::Long
                | MapiValueKind::Boolean
                | MapiValueKind::DateTime
        );
        let unconvertible = || {
            Error::Argument(format!(
                "a value of kind {} cannot be converted to {}",
                value.kind(),
                mapi_type
            ))
        };
        if !convertible {
            return Err(unconvertible());
        }
        match value.natural_text() {
            Some(text) if !text.is_empty() => (entry.parse)(&text).map_err(|_| unconvertible()),
            _ => Err(unconvertible()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_one_entry() {
        for t in MapiPropertyType::ALL.iter() {
            let entry = MapiTypeConverter::entry(*t);
            assert_eq!(entry.is_array(), t.as_str().ends_with("Array"), "{}", t);
        }
        assert_eq!(MAPI_TYPE_CONVERTER_MAP.len(), MapiPropertyType::ALL.len());
    }

    #[test]
    fn property_type_names_round_trip() {
        for t in MapiPropertyType::ALL.iter() {
            assert_eq!(t.as_str().parse::<MapiPropertyType>().unwrap(), *t);
        }
        assert!("Guid".parse::<MapiPropertyType>().is_err());
    }

    #[test]
    fn empty_text_is_default() {
        for t in MapiPropertyType::ALL.iter() {
            let entry = MapiTypeConverter::entry(*t);
            assert_eq!(
                &MapiTypeConverter::convert_to_value(*t, "").unwrap(),
                entry.default_value(),
                "{}",
                t
            );
        }
        assert_eq!(
            MapiTypeConverter::convert_to_value(MapiPropertyType::Integer, "").unwrap(),
            MapiValue::Integer(0)
        );
    }

    #[test]
    fn empty_array_slots_are_default() {
        let values =
            MapiTypeConverter::convert_to_values(MapiPropertyType::IntegerArray, ["7", "", "-3"])
                .unwrap();
        assert_eq!(
            values,
            vec![
                MapiValue::Integer(7),
                MapiValue::Integer(0),
                MapiValue::Integer(-3)
            ]
        );
    }

    #[test]
    fn only_strings_keep_surrounding_whitespace() {
        assert_eq!(
            MapiTypeConverter::convert_to_value(MapiPropertyType::Integer, " 42\n").unwrap(),
            MapiValue::Integer(42)
        );
        assert_eq!(
            MapiTypeConverter::convert_to_value(MapiPropertyType::Boolean, "  ").unwrap(),
            MapiValue::Boolean(false)
        );
        assert_eq!(
            MapiTypeConverter::convert_to_value(MapiPropertyType::String, "  padded  ").unwrap(),
            MapiValue::String("  padded  ".to_string())
        );
    }

    #[test]
    fn malformed_text_is_deserialization_error() {
        for (t, text) in [
            (MapiPropertyType::Integer, "seven"),
            (MapiPropertyType::Short, "70000"),
            (MapiPropertyType::CLSID, "not-a-guid"),
            (MapiPropertyType::SystemTime, "01/02/2020"),
            (MapiPropertyType::Binary, "***"),
            (MapiPropertyType::Boolean, "yes"),
        ] {
            match MapiTypeConverter::convert_to_value(t, text) {
                Err(Error::Deserialization(e)) => {
                    assert_eq!(e.value, text);
                    assert_eq!(e.target, t.as_str());
                }
                other => panic!("{} {:?} gave {:?}", t, text, other),
            }
        }
    }

    #[test]
    fn formatting() {
        use MapiPropertyType as T;
        assert_eq!(MapiTypeConverter::convert_to_string(T::Boolean, None).unwrap(), "");
        assert_eq!(
            MapiTypeConverter::convert_to_string(T::Boolean, Some(&MapiValue::Boolean(true))).unwrap(),
            "true"
        );
        assert_eq!(
            MapiTypeConverter::convert_to_string(T::Binary, Some(&MapiValue::Binary(vec![1, 2, 3]))).unwrap(),
            "AQID"
        );
        assert_eq!(
            MapiTypeConverter::convert_to_string(
                T::SystemTime,
                Some(&MapiValue::DateTime(WireDateTime::utc(2020, 1, 1, 0, 0, 0).unwrap()))
            )
            .unwrap(),
            "2020-01-01T00:00:00Z"
        );
        assert_eq!(
            MapiTypeConverter::convert_to_string(T::Long, Some(&MapiValue::Long(-42))).unwrap(),
            "-42"
        );
        assert!(MapiTypeConverter::convert_to_string(T::Long, Some(&MapiValue::Integer(1))).is_err());
    }

    #[test]
    fn string_round_trip_is_idempotent() {
        use MapiPropertyType as T;
        let guid = Uuid::parse_str("00020329-0000-0000-c000-000000000046").unwrap();
        let samples = vec![
            (T::ApplicationTime, MapiValue::Double(43831.5)),
            (T::Binary, MapiValue::Binary(vec![0, 255, 16])),
            (T::Boolean, MapiValue::Boolean(false)),
            (T::CLSID, MapiValue::Clsid(guid)),
            (T::Currency, MapiValue::Long(1_000_000)),
            (T::Double, MapiValue::Double(-2.25)),
            (T::Error, MapiValue::Integer(-2147221233)),
            (T::Float, MapiValue::Float(0.5)),
            (T::Integer, MapiValue::Integer(i32::MAX)),
            (T::Long, MapiValue::Long(i64::MIN)),
            (T::Short, MapiValue::Short(-1)),
            (
                T::SystemTime,
                MapiValue::DateTime(WireDateTime::utc(2038, 1, 19, 3, 14, 7).unwrap()),
            ),
            (T::String, MapiValue::String("héllo & <world>".to_string())),
            (T::Object, MapiValue::String("opaque".to_string())),
        ];
        for (t, value) in samples {
            let text = MapiTypeConverter::convert_to_string(t, Some(&value)).unwrap();
            assert_eq!(MapiTypeConverter::convert_to_value(t, &text).unwrap(), value, "{}", t);
        }

        let arrays = vec![
            (
                T::StringArray,
                MapiValue::Array(vec!["a".into(), "b".into()]),
            ),
            (
                T::IntegerArray,
                MapiValue::Array(vec![1i32.into(), (-1i32).into()]),
            ),
            (
                T::BinaryArray,
                MapiValue::Array(vec![vec![1u8].into(), vec![2u8, 3].into()]),
            ),
            (
                T::CLSIDArray,
                MapiValue::Array(vec![guid.into(), Uuid::nil().into()]),
            ),
            (
                T::SystemTimeArray,
                MapiValue::Array(vec![
                    WireDateTime::utc(2020, 1, 1, 0, 0, 0).unwrap().into(),
                    WireDateTime::utc(2021, 2, 3, 4, 5, 6).unwrap().into(),
                ]),
            ),
        ];
        for (t, value) in arrays {
            let texts = MapiTypeConverter::convert_to_strings(t, &value).unwrap();
            assert_eq!(texts.len(), 2);
            let parsed = MapiTypeConverter::convert_to_values(t, &texts).unwrap();
            assert_eq!(MapiValue::Array(parsed), value, "{}", t);
        }
    }

    #[test]
    fn change_type_arrays() {
        use MapiPropertyType as T;
        let ok = MapiTypeConverter::change_type(
            T::IntegerArray,
            MapiValue::Array(vec![1i32.into(), 2i32.into()]),
        )
        .unwrap();
        assert_eq!(ok, MapiValue::Array(vec![1i32.into(), 2i32.into()]));

        // no widening of array elements
        assert!(matches!(
            MapiTypeConverter::change_type(T::LongArray, MapiValue::Array(vec![1i32.into()])),
            Err(Error::Argument(_))
        ));
        assert!(matches!(
            MapiTypeConverter::change_type(T::StringArray, MapiValue::Array(vec![])),
            Err(Error::Argument(_))
        ));
        assert!(matches!(
            MapiTypeConverter::change_type(T::StringArray, "a".into()),
            Err(Error::Argument(_))
        ));
    }

    #[test]
    fn change_type_scalars() {
        use MapiPropertyType as T;
        assert_eq!(
            MapiTypeConverter::change_type(T::Long, MapiValue::Integer(5)).unwrap(),
            MapiValue::Long(5)
        );
        assert_eq!(
            MapiTypeConverter::change_type(T::Integer, "12".into()).unwrap(),
            MapiValue::Integer(12)
        );
        assert_eq!(
            MapiTypeConverter::change_type(T::Boolean, "TRUE".into()).unwrap(),
            MapiValue::Boolean(true)
        );
        assert_eq!(
            MapiTypeConverter::change_type(T::SystemTime, "2020-01-01T08:30:00Z".into()).unwrap(),
            MapiValue::DateTime(WireDateTime::utc(2020, 1, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(
            MapiTypeConverter::change_type(T::String, "kept".into()).unwrap(),
            MapiValue::String("kept".to_string())
        );

        match MapiTypeConverter::change_type(T::Binary, MapiValue::Integer(1)) {
            Err(Error::Argument(msg)) => {
                assert!(msg.contains("Integer"));
                assert!(msg.contains("Binary"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(MapiTypeConverter::change_type(T::Short, MapiValue::Long(1 << 40)).is_err());
    }
}
