//! Per-type operation tables.
//!
//! The engine never names a destination's concrete type. Instead, each type
//! `T` used as a destination gets one [`Operations`] table, built from the
//! capabilities `T` registers through [`ArgType`], and shared by every
//! argument of that type.
//!
//! ```
//! use argot::ops::{operations_of, OpKind};
//!
//! let ops = operations_of::<Vec<u16>>();
//! assert!(ops.is_supported(OpKind::Append));
//! assert!(!ops.is_supported(OpKind::Parse));
//! assert_eq!(ops.type_hint(), "list[number]");
//! ```

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::any::AnyValue;
use crate::dest::OpaqueDestination;
use crate::error::ConversionError;
use crate::mode::OpenMode;
use crate::traits::{
    AppendTraits, CountTraits, FormatTraits, MetaType, OpenTraits, ParseTraits, TypeHintTraits,
};

/// Operation kinds a table may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Store,
    StoreConst,
    Append,
    AppendConst,
    Count,
    Parse,
    Open,
}

impl OpKind {
    pub const ALL: [OpKind; 7] = [
        OpKind::Store,
        OpKind::StoreConst,
        OpKind::Append,
        OpKind::AppendConst,
        OpKind::Count,
        OpKind::Parse,
        OpKind::Open,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::StoreConst => "store-const",
            Self::Append => "append",
            Self::AppendConst => "append-const",
            Self::Count => "count",
            Self::Parse => "parse",
            Self::Open => "open",
        }
    }

    /// What a type has to provide to support this operation.
    pub fn requirement(self) -> &'static str {
        match self {
            Self::Store => "nothing (always supported)",
            Self::StoreConst => "`Clone`, registered with `Capabilities::cloneable`",
            Self::Append => "`AppendTraits`, registered with `Capabilities::append`",
            Self::AppendConst => {
                "`AppendTraits` with a cloneable element, registered with `Capabilities::append_const`"
            }
            Self::Count => "`CountTraits`, registered with `Capabilities::count`",
            Self::Parse => "`ParseTraits`, registered with `Capabilities::parse`",
            Self::Open => "`OpenTraits`, registered with `Capabilities::open`",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime interface over one concrete value type.
///
/// Tables are stateless; one instance per type is shared process-wide.
/// Invoking an operation that [`Operations::is_supported`] reports as
/// unsupported panics.
pub trait Operations: Send + Sync + 'static {
    fn type_id(&self) -> TypeId;

    fn type_name(&self) -> &'static str;

    /// Type name with module paths stripped (`Vec<String>`, not
    /// `alloc::vec::Vec<alloc::string::String>`).
    fn short_type_name(&self) -> &str;

    fn is_supported(&self, kind: OpKind) -> bool;

    fn store(&self, dest: &OpaqueDestination<'_>, value: AnyValue);

    fn store_const(&self, dest: &OpaqueDestination<'_>, value: &AnyValue);

    fn append(&self, dest: &OpaqueDestination<'_>, value: AnyValue);

    fn append_const(&self, dest: &OpaqueDestination<'_>, value: &AnyValue);

    /// Empty a container destination. Available wherever `Append` is.
    fn clear(&self, dest: &OpaqueDestination<'_>);

    fn count(&self, dest: &OpaqueDestination<'_>);

    fn parse(&self, text: &str) -> Result<AnyValue, ConversionError>;

    fn open(&self, text: &str, mode: OpenMode) -> Result<AnyValue, ConversionError>;

    fn format_value(&self, value: &AnyValue) -> String {
        self.format_dyn(value.as_any())
    }

    /// Format a borrowed value of this table's type.
    #[doc(hidden)]
    fn format_dyn(&self, value: &dyn Any) -> String;

    /// Clone a borrowed value of this table's type. Requires `StoreConst`.
    #[doc(hidden)]
    fn clone_dyn(&self, value: &dyn Any) -> AnyValue;

    fn meta_type(&self) -> MetaType;

    fn type_hint(&self) -> String;

    /// The element type's table, for containers.
    fn value_type_ops(&self) -> Option<&'static dyn Operations>;
}

impl fmt::Debug for dyn Operations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operations<{}>", self.short_type_name())
    }
}

/// Whether two tables are the same cached instance.
pub fn same_operations(a: &dyn Operations, b: &dyn Operations) -> bool {
    std::ptr::addr_eq(a as *const dyn Operations, b as *const dyn Operations)
}

/// Capability registration for a value type.
///
/// ```
/// use argot::error::ConversionError;
/// use argot::ops::{ArgType, Capabilities, OpKind, operations_of};
/// use argot::traits::ParseTraits;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Level(u8);
///
/// impl ParseTraits for Level {
///     fn parse_text(text: &str) -> Result<Self, ConversionError> {
///         text.parse().map(Level).map_err(|_| ConversionError::message("bad level"))
///     }
/// }
///
/// impl ArgType for Level {
///     fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
///         caps.parse().cloneable()
///     }
/// }
///
/// assert!(operations_of::<Level>().is_supported(OpKind::Parse));
/// assert!(!operations_of::<Level>().is_supported(OpKind::Count));
/// ```
pub trait ArgType: Any + Sized {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self>;
}

type ParseFn<T> = fn(&str) -> Result<T, ConversionError>;
type OpenFn<T> = fn(&str, OpenMode) -> Result<T, ConversionError>;

/// Function table assembled by an [`ArgType`] registration.
pub struct Capabilities<T> {
    clone: Option<fn(&T) -> T>,
    append: Option<fn(&mut T, AnyValue)>,
    append_const: Option<fn(&mut T, &AnyValue)>,
    clear: Option<fn(&mut T)>,
    count: Option<fn(&mut T)>,
    parse: Option<ParseFn<T>>,
    open: Option<OpenFn<T>>,
    format: Option<fn(&T) -> String>,
    display: Option<fn(&T) -> String>,
    hint: Option<fn() -> String>,
    meta: MetaType,
    value_type: Option<fn() -> &'static dyn Operations>,
}

impl<T: Any> Capabilities<T> {
    fn new() -> Self {
        Self {
            clone: None,
            append: None,
            append_const: None,
            clear: None,
            count: None,
            parse: None,
            open: None,
            format: None,
            display: None,
            hint: None,
            meta: MetaType::Other,
            value_type: None,
        }
    }

    /// Enables store-const (and defaults).
    pub fn cloneable(self) -> Self
    where
        T: Clone,
    {
        self.with_clone(T::clone)
    }

    pub fn parse(self) -> Self
    where
        T: ParseTraits,
    {
        self.with_parse(T::parse_text)
    }

    pub fn open(self) -> Self
    where
        T: OpenTraits,
    {
        let mut caps = self.with_open(T::open_path);
        if caps.meta == MetaType::Other {
            caps.meta = MetaType::File;
        }
        caps
    }

    pub fn count(mut self) -> Self
    where
        T: CountTraits,
    {
        self.count = Some(T::increment);
        self
    }

    pub fn append(mut self) -> Self
    where
        T: AppendTraits,
        T::Value: ArgType,
    {
        self.append = Some(append_erased::<T>);
        self.clear = Some(T::clear_values);
        self.value_type = Some(operations_of::<T::Value>);
        if self.meta == MetaType::Other {
            self.meta = MetaType::List;
        }
        self
    }

    /// Enabled only when the element type is itself cloneable.
    pub fn append_const(mut self) -> Self
    where
        T: AppendTraits,
        T::Value: ArgType,
    {
        if operations_of::<T::Value>().is_supported(OpKind::StoreConst) {
            self.append_const = Some(append_const_erased::<T>);
        }
        self
    }

    /// Format through `Display`, unless a custom formatter is registered.
    pub fn display(mut self) -> Self
    where
        T: fmt::Display,
    {
        self.display = Some(display_format::<T>);
        self
    }

    /// Format through a custom `FormatTraits` impl. Takes priority over
    /// [`Capabilities::display`] regardless of registration order.
    pub fn format(self) -> Self
    where
        T: FormatTraits,
    {
        self.with_format(T::format_text)
    }

    pub fn hint(mut self) -> Self
    where
        T: TypeHintTraits,
    {
        self.hint = Some(T::type_hint);
        self
    }

    pub fn meta(mut self, meta: MetaType) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_clone(mut self, f: fn(&T) -> T) -> Self {
        self.clone = Some(f);
        self
    }

    pub fn with_parse(mut self, f: ParseFn<T>) -> Self {
        self.parse = Some(f);
        self
    }

    pub fn with_open(mut self, f: OpenFn<T>) -> Self {
        self.open = Some(f);
        self
    }

    pub fn with_format(mut self, f: fn(&T) -> String) -> Self {
        self.format = Some(f);
        self
    }
}

fn append_erased<C>(container: &mut C, value: AnyValue)
where
    C: AppendTraits,
    C::Value: Any,
{
    container.append_value(value.into_inner::<C::Value>());
}

fn append_const_erased<C>(container: &mut C, value: &AnyValue)
where
    C: AppendTraits,
    C::Value: ArgType,
{
    let copy = operations_of::<C::Value>().clone_dyn(value.as_any());
    container.append_value(copy.into_inner());
}

fn display_format<T: fmt::Display>(value: &T) -> String {
    value.to_string()
}

struct TypedOperations<T> {
    caps: Capabilities<T>,
    short_name: String,
}

impl<T: ArgType> TypedOperations<T> {
    fn new() -> Self {
        Self {
            caps: T::capabilities(Capabilities::new()),
            short_name: short_type_name(std::any::type_name::<T>()),
        }
    }

    #[track_caller]
    fn unsupported(&self, kind: OpKind) -> ! {
        panic!(
            "operation `{kind}` is not supported for type `{}`: it requires {}",
            self.short_name,
            kind.requirement()
        )
    }
}

impl<T: ArgType> Operations for TypedOperations<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn short_type_name(&self) -> &str {
        &self.short_name
    }

    fn is_supported(&self, kind: OpKind) -> bool {
        let caps = &self.caps;
        match kind {
            OpKind::Store => true,
            OpKind::StoreConst => caps.clone.is_some(),
            OpKind::Append => caps.append.is_some(),
            OpKind::AppendConst => caps.append_const.is_some(),
            OpKind::Count => caps.count.is_some(),
            OpKind::Parse => caps.parse.is_some(),
            OpKind::Open => caps.open.is_some(),
        }
    }

    fn store(&self, dest: &OpaqueDestination<'_>, value: AnyValue) {
        dest.store(value.into_inner::<T>());
    }

    fn store_const(&self, dest: &OpaqueDestination<'_>, value: &AnyValue) {
        let Some(clone) = self.caps.clone else {
            self.unsupported(OpKind::StoreConst)
        };
        dest.store(clone(value.cast::<T>()));
    }

    fn append(&self, dest: &OpaqueDestination<'_>, value: AnyValue) {
        let Some(append) = self.caps.append else {
            self.unsupported(OpKind::Append)
        };
        dest.with_mut(|container: &mut T| append(container, value));
    }

    fn append_const(&self, dest: &OpaqueDestination<'_>, value: &AnyValue) {
        let Some(append) = self.caps.append_const else {
            self.unsupported(OpKind::AppendConst)
        };
        dest.with_mut(|container: &mut T| append(container, value));
    }

    fn clear(&self, dest: &OpaqueDestination<'_>) {
        let Some(clear) = self.caps.clear else {
            self.unsupported(OpKind::Append)
        };
        dest.with_mut(clear);
    }

    fn count(&self, dest: &OpaqueDestination<'_>) {
        let Some(count) = self.caps.count else {
            self.unsupported(OpKind::Count)
        };
        dest.with_mut(count);
    }

    fn parse(&self, text: &str) -> Result<AnyValue, ConversionError> {
        let Some(parse) = self.caps.parse else {
            self.unsupported(OpKind::Parse)
        };
        convert_results(parse(text))
    }

    fn open(&self, text: &str, mode: OpenMode) -> Result<AnyValue, ConversionError> {
        let Some(open) = self.caps.open else {
            self.unsupported(OpKind::Open)
        };
        convert_results(open(text, mode))
    }

    fn format_dyn(&self, value: &dyn Any) -> String {
        let Some(value) = value.downcast_ref::<T>() else {
            panic!(
                "format_value called with a value that is not `{}`",
                self.short_name
            );
        };
        match self.caps.format.or(self.caps.display) {
            Some(format) => format(value),
            None => format!("<{} object>", self.short_name),
        }
    }

    fn clone_dyn(&self, value: &dyn Any) -> AnyValue {
        let Some(clone) = self.caps.clone else {
            self.unsupported(OpKind::StoreConst)
        };
        match value.downcast_ref::<T>() {
            Some(value) => AnyValue::new(clone(value)),
            None => panic!(
                "clone_value called with a value that is not `{}`",
                self.short_name
            ),
        }
    }

    fn meta_type(&self) -> MetaType {
        self.caps.meta
    }

    fn type_hint(&self) -> String {
        if let Some(hint) = self.caps.hint {
            return hint();
        }
        match self.caps.meta {
            MetaType::String => "string".to_string(),
            MetaType::Bool => "bool".to_string(),
            MetaType::Char => "char".to_string(),
            MetaType::File => "file".to_string(),
            MetaType::Number => "number".to_string(),
            MetaType::List => match self.value_type_ops() {
                Some(elem) => format!("list[{}]", elem.type_hint()),
                None => "list".to_string(),
            },
            MetaType::Other => self.short_name.clone(),
        }
    }

    fn value_type_ops(&self) -> Option<&'static dyn Operations> {
        self.caps.value_type.map(|f| f())
    }
}

fn convert_results<T: Any>(result: Result<T, ConversionError>) -> Result<AnyValue, ConversionError> {
    result.map(AnyValue::new)
}

type Registry = Mutex<HashMap<TypeId, &'static dyn Operations>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The shared table for `T`, built on first use.
pub fn operations_of<T: ArgType>() -> &'static dyn Operations {
    let registry = REGISTRY.get_or_init(Registry::default);
    let id = TypeId::of::<T>();
    if let Some(ops) = lock(registry).get(&id) {
        return *ops;
    }

    // Built outside the lock: registrations may look up element tables.
    let built: &'static dyn Operations = Box::leak(Box::new(TypedOperations::<T>::new()));
    let mut map = lock(registry);
    let ops = *map.entry(id).or_insert_with(|| {
        tracing::trace!(type_name = built.short_type_name(), "registered operations table");
        built
    });
    ops
}

fn lock(registry: &Registry) -> std::sync::MutexGuard<'_, HashMap<TypeId, &'static dyn Operations>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Strip module paths from a `std::any::type_name` string.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for c in full.chars() {
        match c {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                out.push_str(last_path_segment(&segment));
                segment.clear();
                out.push(c);
            }
            _ => segment.push(c),
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

macro_rules! number_types {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ArgType for $ty {
                fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
                    caps.parse().cloneable().display().count().meta(MetaType::Number)
                }
            }
        )*
    };
}

number_types!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl ArgType for f32 {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.parse().cloneable().display().meta(MetaType::Number)
    }
}

impl ArgType for f64 {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.parse().cloneable().display().meta(MetaType::Number)
    }
}

impl ArgType for bool {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.parse().cloneable().display().meta(MetaType::Bool)
    }
}

impl ArgType for char {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.parse().cloneable().display().meta(MetaType::Char)
    }
}

impl ArgType for String {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.parse().cloneable().display().meta(MetaType::String)
    }
}

impl ArgType for PathBuf {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.parse()
            .cloneable()
            .with_format(|path| path.display().to_string())
            .meta(MetaType::String)
    }
}

impl ArgType for OsString {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.parse()
            .cloneable()
            .with_format(|s| s.to_string_lossy().into_owned())
            .meta(MetaType::String)
    }
}

impl ArgType for File {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.open()
    }
}

impl ArgType for BufReader<File> {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.open()
    }
}

impl ArgType for BufWriter<File> {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        caps.open()
    }
}

impl<T: ArgType> ArgType for Vec<T> {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        let caps = caps
            .append()
            .append_const()
            .with_format(|items| format_items(items.iter()));
        if operations_of::<T>().is_supported(OpKind::StoreConst) {
            caps.with_clone(clone_items::<Self, T>)
        } else {
            caps
        }
    }
}

impl<T: ArgType> ArgType for VecDeque<T> {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        let caps = caps
            .append()
            .append_const()
            .with_format(|items| format_items(items.iter()));
        if operations_of::<T>().is_supported(OpKind::StoreConst) {
            caps.with_clone(clone_items::<Self, T>)
        } else {
            caps
        }
    }
}

/// `Option<T>` parses like `T` and stores `Some`.
impl<T: ArgType> ArgType for Option<T> {
    fn capabilities(caps: Capabilities<Self>) -> Capabilities<Self> {
        let inner = operations_of::<T>();
        let mut caps = caps
            .with_format(format_option::<T>)
            .meta(inner.meta_type());
        if inner.is_supported(OpKind::StoreConst) {
            caps = caps.with_clone(clone_option::<T>);
        }
        if inner.is_supported(OpKind::Parse) {
            caps = caps.with_parse(parse_option::<T>);
        }
        if inner.is_supported(OpKind::Open) {
            caps = caps.with_open(open_option::<T>);
        }
        if inner.meta_type() == MetaType::Other || inner.meta_type() == MetaType::List {
            caps.hint = Some(hint_of::<T>);
        }
        caps
    }
}

fn format_items<'v, T: ArgType>(items: impl Iterator<Item = &'v T>) -> String {
    let ops = operations_of::<T>();
    let parts: Vec<String> = items.map(|item| ops.format_dyn(item)).collect();
    format!("[{}]", parts.join(", "))
}

fn clone_items<C, T>(items: &C) -> C
where
    C: FromIterator<T>,
    for<'v> &'v C: IntoIterator<Item = &'v T>,
    T: ArgType,
{
    let ops = operations_of::<T>();
    items
        .into_iter()
        .map(|item| ops.clone_dyn(item).into_inner::<T>())
        .collect()
}

fn clone_option<T: ArgType>(value: &Option<T>) -> Option<T> {
    value
        .as_ref()
        .map(|inner| operations_of::<T>().clone_dyn(inner).into_inner::<T>())
}

fn format_option<T: ArgType>(value: &Option<T>) -> String {
    match value {
        Some(inner) => operations_of::<T>().format_dyn(inner),
        None => "none".to_string(),
    }
}

fn parse_option<T: ArgType>(text: &str) -> Result<Option<T>, ConversionError> {
    operations_of::<T>()
        .parse(text)
        .map(|value| Some(value.into_inner::<T>()))
}

fn open_option<T: ArgType>(text: &str, mode: OpenMode) -> Result<Option<T>, ConversionError> {
    operations_of::<T>()
        .open(text, mode)
        .map(|value| Some(value.into_inner::<T>()))
}

fn hint_of<T: ArgType>() -> String {
    operations_of::<T>().type_hint()
}
