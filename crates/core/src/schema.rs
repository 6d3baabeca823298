//! Declarative parameter schemas.
//!
//! A schema describes one pluggable operation: its ordered inputs, its ordered
//! outputs and the function that runs it. Schemas are built in code with
//! [`ParameterSchema::builder`] or loaded from JSON with
//! [`ParameterSchema::from_json`]:
//!
//! ```json
//! {
//!   "name": "gaussian_blur",
//!   "inputs": {
//!     "image": { "type": "Image", "label": "Image", "help": "Input image" },
//!     "sigma": { "type": "float", "label": "Sigma", "default": 1.5 }
//!   },
//!   "outputs": {
//!     "blurred": { "type": "Image", "label": "Blurred" }
//!   }
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::call::{AlgorithmOutput, Arguments};
use crate::error::{Error, Result};

/// Declared type of a parameter. Selects the control built for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    Image,
    ZyxInt,
    ZyxFloat,
    Float,
    Int,
    Bool,
    Select,
    /// Free text. Unknown type strings land here.
    String,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::ZyxInt => "zyx-int",
            Self::ZyxFloat => "zyx-float",
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Select => "select",
            Self::String => "string",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Image" => Self::Image,
            "zyx-int" => Self::ZyxInt,
            "zyx-float" => Self::ZyxFloat,
            "float" => Self::Float,
            "int" => Self::Int,
            "bool" => Self::Bool,
            "select" => Self::Select,
            _ => Self::String,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image)
    }
}

impl From<String> for ParamType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ParamType> for String {
    fn from(t: ParamType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value of an input, as written in the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// `[z, y, x]`
    Triple([f64; 3]),
}

impl DefaultValue {
    /// Text shown in a single-field control.
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::Triple([z, y, x]) => format!("{z}, {y}, {x}"),
        }
    }

    /// Texts for the z, y and x fields of a coordinate control.
    /// A scalar default fills all three fields.
    pub fn triple_texts(&self) -> [String; 3] {
        match self {
            Self::Triple(v) => v.map(|c| c.to_string()),
            other => {
                let text = other.to_text();
                [text.clone(), text.clone(), text]
            }
        }
    }

    /// Only an explicit false selects "False" in a toggle.
    pub fn is_false(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::Int(v) => *v == 0,
            Self::Text(s) => s.trim().eq_ignore_ascii_case("false"),
            _ => false,
        }
    }
}

impl From<bool> for DefaultValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for DefaultValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for DefaultValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for DefaultValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DefaultValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<[f64; 3]> for DefaultValue {
    fn from(v: [f64; 3]) -> Self {
        Self::Triple(v)
    }
}

impl From<[i64; 3]> for DefaultValue {
    fn from(v: [i64; 3]) -> Self {
        Self::Triple(v.map(|c| c as f64))
    }
}

/// Definition of a single input parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDef {
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub label: String,
    #[serde(default)]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub advanced: bool,
    /// Allowed values of a `select` input.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<DefaultValue>,
}

impl InputDef {
    pub fn new(kind: ParamType, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            help: String::new(),
            default: None,
            advanced: false,
            values: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DefaultValue>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Hide the control until advanced mode is enabled.
    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }
}

/// Definition of a single output slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDef {
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub label: String,
}

impl OutputDef {
    pub fn image(label: impl Into<String>) -> Self {
        Self {
            kind: ParamType::Image,
            label: label.into(),
        }
    }
}

/// Algorithm entry point: one argument per input key, plus observers when
/// the schema accepts them.
pub type AlgorithmFn = Arc<dyn Fn(&Arguments) -> Result<AlgorithmOutput> + Send + Sync>;

/// Immutable description of one pluggable operation.
#[derive(Clone)]
pub struct ParameterSchema {
    name: String,
    inputs: Vec<(String, InputDef)>,
    outputs: Vec<(String, OutputDef)>,
    accepts_observers: bool,
    fnc: AlgorithmFn,
}

impl fmt::Debug for ParameterSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSchema")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("accepts_observers", &self.accepts_observers)
            .finish_non_exhaustive()
    }
}

impl ParameterSchema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            accepts_observers: false,
            fnc: None,
        }
    }

    /// Load the declarative part of a schema from JSON and bind it to `fnc`.
    pub fn from_json<F>(text: &str, fnc: F) -> Result<Self>
    where
        F: Fn(&Arguments) -> Result<AlgorithmOutput> + Send + Sync + 'static,
    {
        let doc: SchemaDocument = serde_json::from_str(text)?;
        let mut builder = Self::builder(doc.name)
            .accepts_observers(doc.accepts_observers)
            .function(fnc);
        builder.inputs = doc.inputs.0;
        builder.outputs = doc.outputs.0;
        builder.build()
    }

    /// Serialize the declarative part of the schema.
    pub fn to_json(&self) -> Result<String> {
        let doc = SchemaDocument {
            name: self.name.clone(),
            inputs: Entries(self.inputs.clone()),
            outputs: Entries(self.outputs.clone()),
            accepts_observers: self.accepts_observers,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inputs in declared order.
    pub fn inputs(&self) -> &[(String, InputDef)] {
        &self.inputs
    }

    /// Outputs in declared order.
    pub fn outputs(&self) -> &[(String, OutputDef)] {
        &self.outputs
    }

    pub fn input(&self, key: &str) -> Option<&InputDef> {
        self.inputs.iter().find(|(k, _)| k == key).map(|(_, d)| d)
    }

    pub fn output(&self, key: &str) -> Option<&OutputDef> {
        self.outputs.iter().find(|(k, _)| k == key).map(|(_, d)| d)
    }

    pub fn accepts_observers(&self) -> bool {
        self.accepts_observers
    }

    /// Invoke the algorithm.
    pub fn call(&self, args: &Arguments) -> Result<AlgorithmOutput> {
        (self.fnc)(args)
    }
}

/// Builder for [`ParameterSchema`].
pub struct SchemaBuilder {
    name: String,
    inputs: Vec<(String, InputDef)>,
    outputs: Vec<(String, OutputDef)>,
    accepts_observers: bool,
    fnc: Option<AlgorithmFn>,
}

impl SchemaBuilder {
    pub fn input(mut self, key: impl Into<String>, def: InputDef) -> Self {
        self.inputs.push((key.into(), def));
        self
    }

    pub fn output(mut self, key: impl Into<String>, def: OutputDef) -> Self {
        self.outputs.push((key.into(), def));
        self
    }

    /// The function receives the observer list in its arguments.
    pub fn accepts_observers(mut self, accepts: bool) -> Self {
        self.accepts_observers = accepts;
        self
    }

    pub fn function<F>(mut self, fnc: F) -> Self
    where
        F: Fn(&Arguments) -> Result<AlgorithmOutput> + Send + Sync + 'static,
    {
        self.fnc = Some(Arc::new(fnc));
        self
    }

    pub fn build(self) -> Result<ParameterSchema> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidSchema("schema name is empty".into()));
        }
        let fnc = self.fnc.ok_or_else(|| {
            Error::InvalidSchema(format!("schema {} has no function", self.name))
        })?;

        check_unique(&self.name, "input", self.inputs.iter().map(|(k, _)| k))?;
        check_unique(&self.name, "output", self.outputs.iter().map(|(k, _)| k))?;

        for (key, def) in &self.inputs {
            if def.kind == ParamType::Select && def.values.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "select input {key} of {} has no values",
                    self.name
                )));
            }
        }

        Ok(ParameterSchema {
            name: self.name,
            inputs: self.inputs,
            outputs: self.outputs,
            accepts_observers: self.accepts_observers,
            fnc,
        })
    }
}

fn check_unique<'a>(
    schema: &str,
    what: &str,
    keys: impl Iterator<Item = &'a String>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate {what} key {key} in {schema}"
            )));
        }
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct SchemaDocument {
    name: String,
    #[serde(default = "Entries::empty")]
    inputs: Entries<InputDef>,
    #[serde(default = "Entries::empty")]
    outputs: Entries<OutputDef>,
    #[serde(default)]
    accepts_observers: bool,
}

/// A JSON object read as an ordered list of entries.
struct Entries<T>(Vec<(String, T)>);

impl<T> Entries<T> {
    fn empty() -> Self {
        Self(Vec::new())
    }
}

impl<T: Serialize> Serialize for Entries<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Entries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, T)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(de::Error::custom(format!("duplicate key `{key}`")));
                    }
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
