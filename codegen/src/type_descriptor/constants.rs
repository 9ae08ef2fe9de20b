// ============================================================================
// CORE TYPE NAMES
// ============================================================================

pub const TYPE_OBJECT: &str = "java.lang.Object";
pub const TYPE_STRING: &str = "java.lang.String";
pub const TYPE_CHAR_SEQUENCE: &str = "java.lang.CharSequence";

// Boxed primitives
pub const TYPE_BOOLEAN: &str = "java.lang.Boolean";
pub const TYPE_BYTE: &str = "java.lang.Byte";
pub const TYPE_SHORT: &str = "java.lang.Short";
pub const TYPE_INTEGER: &str = "java.lang.Integer";
pub const TYPE_LONG: &str = "java.lang.Long";
pub const TYPE_FLOAT: &str = "java.lang.Float";
pub const TYPE_DOUBLE: &str = "java.lang.Double";
pub const TYPE_CHARACTER: &str = "java.lang.Character";
pub const TYPE_BIG_DECIMAL: &str = "java.math.BigDecimal";
pub const TYPE_BIG_INTEGER: &str = "java.math.BigInteger";

// ============================================================================
// DATE TYPE NAMES
// ============================================================================

pub const TYPE_LOCAL_DATE: &str = "java.time.LocalDate";
pub const TYPE_LOCAL_DATE_TIME: &str = "java.time.LocalDateTime";
pub const TYPE_LOCAL_TIME: &str = "java.time.LocalTime";
pub const TYPE_OFFSET_DATE_TIME: &str = "java.time.OffsetDateTime";
pub const TYPE_ZONED_DATE_TIME: &str = "java.time.ZonedDateTime";
pub const TYPE_INSTANT: &str = "java.time.Instant";
pub const TYPE_UTIL_DATE: &str = "java.util.Date";

// ============================================================================
// CONTAINER TYPE NAMES
// ============================================================================

pub const TYPE_OPTIONAL: &str = "java.util.Optional";
pub const TYPE_OPTIONAL_INT: &str = "java.util.OptionalInt";
pub const TYPE_OPTIONAL_LONG: &str = "java.util.OptionalLong";
pub const TYPE_OPTIONAL_DOUBLE: &str = "java.util.OptionalDouble";

/// Container shapes written as JSON arrays
pub const COLLECTION_TYPES: &[&str] = &[
    "java.lang.Iterable",
    "java.util.Collection",
    "java.util.List",
    "java.util.ArrayList",
    "java.util.LinkedList",
    "java.util.Set",
    "java.util.HashSet",
    "java.util.LinkedHashSet",
    "java.util.SortedSet",
    "java.util.NavigableSet",
    "java.util.TreeSet",
    "java.util.Queue",
    "java.util.Deque",
    "java.util.ArrayDeque",
];

/// Container shapes written as JSON objects
pub const MAP_TYPES: &[&str] = &[
    "java.util.Map",
    "java.util.HashMap",
    "java.util.LinkedHashMap",
    "java.util.SortedMap",
    "java.util.NavigableMap",
    "java.util.TreeMap",
    "java.util.concurrent.ConcurrentMap",
    "java.util.concurrent.ConcurrentHashMap",
];

/// Boxed numeric and boolean wrappers
pub const BOXED_TYPES: &[&str] = &[
    TYPE_BOOLEAN,
    TYPE_BYTE,
    TYPE_SHORT,
    TYPE_INTEGER,
    TYPE_LONG,
    TYPE_FLOAT,
    TYPE_DOUBLE,
    TYPE_CHARACTER,
    TYPE_BIG_DECIMAL,
    TYPE_BIG_INTEGER,
];

/// Temporal types written through the configured date format
pub const DATE_TYPES: &[&str] = &[
    TYPE_LOCAL_DATE,
    TYPE_LOCAL_DATE_TIME,
    TYPE_LOCAL_TIME,
    TYPE_OFFSET_DATE_TIME,
    TYPE_ZONED_DATE_TIME,
    TYPE_INSTANT,
    TYPE_UTIL_DATE,
];

/// Types whose instances are written as JSON strings
pub const STRING_TYPES: &[&str] = &[TYPE_STRING, TYPE_CHAR_SEQUENCE, "java.util.UUID", "java.net.URI"];

// ============================================================================
// ACCESSOR CONSTANTS
// ============================================================================

pub const GETTER_PREFIX: &str = "get";
pub const BOOLEAN_GETTER_PREFIX: &str = "is";
pub const GET_CLASS_METHOD: &str = "getClass";

// ============================================================================
// OUTPUT CONSTANTS
// ============================================================================

/// Default package prefix for generated unit identifiers
pub const DEFAULT_UNIT_PREFIX: &str = "jsonb.serializers.";

/// Suffix appended to the unit name derived from the root type
pub const UNIT_SUFFIX: &str = "Serializer";
