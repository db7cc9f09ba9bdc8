//! Runtime type descriptors for filter targets.
//!
//! A target type describes its members once through [`TypeInfo`] and hands out
//! member values by index through [`Reflect::member`]. The [`impl_reflect!`]
//! and [`impl_reflect_enum!`] macros generate both halves for plain structs
//! and field-less enums.
//!
//! ```ignore
//! impl_reflect_enum!(Status { Active, Pending, Closed });
//!
//! impl_reflect!(Ticket {
//!     property "Title" => title: String,
//!     property "Status" => status: Status,
//!     field "code" => code: i32,
//!     internal "Secret" => secret: String,
//! });
//! ```

use crate::value::Value;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// Shape of a member as seen by the resolver and the coercer.
#[derive(Clone)]
pub enum Type {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    Uuid,
    /// Absolute date/time without offset
    DateTime,
    /// Offset-aware date/time
    DateTimeOffset,
    Enum(&'static EnumInfo),
    Nullable(Box<Type>),
    /// Lazily resolved so that types may refer to each other
    Object(fn() -> &'static TypeInfo),
    Collection(Box<Type>),
}

impl Type {
    /// Strips a single nullable wrapper.
    pub fn underlying(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }

    /// Types that support `<`, `<=`, `>`, `>=`.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self.underlying(),
            Type::I8
                | Type::I16
                | Type::I32
                | Type::I64
                | Type::F32
                | Type::F64
                | Type::Decimal
                | Type::DateTime
                | Type::DateTimeOffset
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(self.underlying(), Type::String)
    }

    /// Scalars and enums; objects and collections are not literal targets.
    pub fn is_scalar(&self) -> bool {
        !matches!(self.underlying(), Type::Object(_) | Type::Collection(_))
    }

    /// Element type of a (possibly nullable) collection.
    pub fn element(&self) -> Option<&Type> {
        match self.underlying() {
            Type::Collection(element) => Some(element),
            _ => None,
        }
    }

    /// Member table of a (possibly nullable) object type.
    pub fn object_info(&self) -> Option<&'static TypeInfo> {
        match self.underlying() {
            Type::Object(info) => Some(info()),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Type::String => "String".into(),
            Type::Bool => "Bool".into(),
            Type::I8 => "I8".into(),
            Type::I16 => "I16".into(),
            Type::I32 => "I32".into(),
            Type::I64 => "I64".into(),
            Type::F32 => "F32".into(),
            Type::F64 => "F64".into(),
            Type::Decimal => "Decimal".into(),
            Type::Uuid => "Uuid".into(),
            Type::DateTime => "DateTime".into(),
            Type::DateTimeOffset => "DateTimeOffset".into(),
            Type::Enum(info) => info.name.to_string(),
            Type::Nullable(inner) => format!("{}?", inner.name()),
            Type::Object(info) => info().name.to_string(),
            Type::Collection(element) => format!("[{}]", element.name()),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    /// Never reachable from a filter path
    Internal,
}

#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub name: &'static str,
    pub kind: MemberKind,
    pub visibility: Visibility,
    /// Argument for [`Reflect::member`]
    pub index: usize,
    pub ty: Type,
}

#[derive(Debug)]
pub struct TypeInfo {
    pub name: &'static str,
    pub members: Vec<MemberInfo>,
}

impl TypeInfo {
    /// Builds a member table; indices follow declaration order.
    pub fn new(
        name: &'static str,
        members: Vec<(&'static str, MemberKind, Visibility, Type)>,
    ) -> Self {
        let members = members
            .into_iter()
            .enumerate()
            .map(|(index, (name, kind, visibility, ty))| MemberInfo {
                name,
                kind,
                visibility,
                index,
                ty,
            })
            .collect();
        Self { name, members }
    }

    pub fn public_members(&self, kind: MemberKind) -> impl Iterator<Item = &MemberInfo> {
        self.members
            .iter()
            .filter(move |m| m.kind == kind && m.visibility == Visibility::Public)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct EnumInfo {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumInfo {
    pub fn variant(&self, ordinal: usize) -> Option<&'static str> {
        self.variants.get(ordinal).copied()
    }

    /// Case-insensitive variant lookup.
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.variants
            .iter()
            .position(|v| *v == name)
            .or_else(|| self.variants.iter().position(|v| v.eq_ignore_ascii_case(name)))
    }
}

/// A filterable object.
pub trait Reflect {
    fn type_info() -> &'static TypeInfo
    where
        Self: Sized;

    /// Value of the member at `index` in [`TypeInfo::members`].
    fn member(&self, index: usize) -> Value<'_>;
}

/// Maps a Rust field type to its descriptor.
pub trait Typed {
    fn ty() -> Type;
}

/// Borrows a Rust field as a [`Value`].
pub trait IntoValue {
    fn to_value(&self) -> Value<'_>;
}

macro_rules! scalar {
    ($rust:ty, $ty:ident, |$v:ident| $value:expr) => {
        impl Typed for $rust {
            fn ty() -> Type {
                Type::$ty
            }
        }

        impl IntoValue for $rust {
            fn to_value(&self) -> Value<'_> {
                let $v = self;
                $value
            }
        }
    };
}

scalar!(String, String, |v| Value::Str(v.as_str()));
scalar!(bool, Bool, |v| Value::Bool(*v));
scalar!(i8, I8, |v| Value::Int(i64::from(*v)));
scalar!(i16, I16, |v| Value::Int(i64::from(*v)));
scalar!(i32, I32, |v| Value::Int(i64::from(*v)));
scalar!(i64, I64, |v| Value::Int(*v));
scalar!(f32, F32, |v| Value::Float(f64::from(*v)));
scalar!(f64, F64, |v| Value::Float(*v));
scalar!(Decimal, Decimal, |v| Value::Decimal(*v));
scalar!(Uuid, Uuid, |v| Value::Uuid(*v));
scalar!(NaiveDateTime, DateTime, |v| Value::DateTime(*v));
scalar!(DateTime<FixedOffset>, DateTimeOffset, |v| Value::DateTimeOffset(*v));

impl<T: Typed> Typed for Option<T> {
    fn ty() -> Type {
        Type::Nullable(Box::new(T::ty()))
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn to_value(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn ty() -> Type {
        Type::Collection(Box::new(T::ty()))
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn to_value(&self) -> Value<'_> {
        Value::List(self.iter().map(IntoValue::to_value).collect())
    }
}

/// Implements [`Reflect`], [`Typed`] and [`IntoValue`] for a struct.
///
/// Members are `property`, `field` or `internal` (present in the table but
/// never resolvable from a filter path).
#[macro_export]
macro_rules! impl_reflect {
    (@kind property) => { $crate::reflect::MemberKind::Property };
    (@kind field) => { $crate::reflect::MemberKind::Field };
    (@kind internal) => { $crate::reflect::MemberKind::Property };
    (@visibility internal) => { $crate::reflect::Visibility::Internal };
    (@visibility $other:ident) => { $crate::reflect::Visibility::Public };
    ($target:ty { $($kind:ident $name:literal => $field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::reflect::Reflect for $target {
            fn type_info() -> &'static $crate::reflect::TypeInfo {
                static INFO: ::std::sync::LazyLock<$crate::reflect::TypeInfo> =
                    ::std::sync::LazyLock::new(|| {
                        $crate::reflect::TypeInfo::new(
                            stringify!($target),
                            vec![$((
                                $name,
                                $crate::impl_reflect!(@kind $kind),
                                $crate::impl_reflect!(@visibility $kind),
                                <$fty as $crate::reflect::Typed>::ty(),
                            )),*],
                        )
                    });
                &INFO
            }

            #[allow(unused_assignments)]
            fn member(&self, index: usize) -> $crate::value::Value<'_> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::reflect::IntoValue::to_value(&self.$field);
                    }
                    position += 1;
                )*
                $crate::value::Value::Null
            }
        }

        impl $crate::reflect::Typed for $target {
            fn ty() -> $crate::reflect::Type {
                $crate::reflect::Type::Object(<$target as $crate::reflect::Reflect>::type_info)
            }
        }

        impl $crate::reflect::IntoValue for $target {
            fn to_value(&self) -> $crate::value::Value<'_> {
                $crate::value::Value::Object(self)
            }
        }
    };
}

/// Implements [`Typed`] and [`IntoValue`] for a field-less enum.
#[macro_export]
macro_rules! impl_reflect_enum {
    ($target:ident { $($variant:ident),+ $(,)? }) => {
        impl $target {
            pub const ENUM_INFO: $crate::reflect::EnumInfo = $crate::reflect::EnumInfo {
                name: stringify!($target),
                variants: &[$(stringify!($variant)),+],
            };
        }

        impl $crate::reflect::Typed for $target {
            fn ty() -> $crate::reflect::Type {
                static INFO: $crate::reflect::EnumInfo = $target::ENUM_INFO;
                $crate::reflect::Type::Enum(&INFO)
            }
        }

        impl $crate::reflect::IntoValue for $target {
            fn to_value(&self) -> $crate::value::Value<'_> {
                let name = match self {
                    $($target::$variant => stringify!($variant)),+
                };
                let ordinal = $target::ENUM_INFO
                    .variants
                    .iter()
                    .position(|v| *v == name)
                    .unwrap_or_default();
                $crate::value::Value::Enum(ordinal)
            }
        }
    };
}
