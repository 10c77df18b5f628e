//! In-memory model of a material override layer and its USDA rendering.

use std::fmt::{self, Write};

use rmx_texture::IdentityKey;

/// Scope that holds the material overrides in the Remix capture layout.
pub const ROOT_PRIM: &str = "RootNode";
pub const LOOKS_SCOPE: &str = "Looks";
pub const SHADER_PRIM: &str = "Shader";

const INDENT: &str = "    ";

/// Value of a shader input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Asset path, written as `@path@`. An empty path renders as `@@`.
    Asset(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl InputValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            InputValue::Asset(_) => "asset",
            InputValue::Bool(_) => "bool",
            InputValue::Int(_) => "int",
            InputValue::Float(_) => "float",
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Asset(path) => write!(f, "@{}@", path),
            InputValue::Bool(value) => f.write_str(if *value { "1" } else { "0" }),
            InputValue::Int(value) => write!(f, "{}", value),
            InputValue::Float(value) => write!(f, "{}", value),
        }
    }
}

/// Authoring metadata attached to an input, as shown in the Remix UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputMetadata {
    pub color_space: Option<String>,
    /// Written into `customData` as the input's default value.
    pub default: Option<InputValue>,
    /// `(min, max)` written into `customData` as the `range` dictionary.
    pub range: Option<(f64, f64)>,
    pub display_group: Option<String>,
    pub display_name: Option<String>,
    pub doc: Option<String>,
    pub hidden: Option<bool>,
}

impl InputMetadata {
    fn is_empty(&self) -> bool {
        self == &InputMetadata::default()
    }
}

/// A single `inputs:<name>` attribute on the shader prim.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderInput {
    pub name: String,
    pub value: InputValue,
    pub metadata: InputMetadata,
}

impl ShaderInput {
    pub fn new(name: impl Into<String>, value: InputValue) -> Self {
        Self {
            name: name.into(),
            value,
            metadata: InputMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: InputMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    fn render(&self, out: &mut String, depth: usize) -> fmt::Result {
        let type_name = self.value.type_name();
        let head = format!("{} inputs:{} = {}", type_name, self.name, self.value);

        let meta = &self.metadata;
        if meta.is_empty() {
            return line(out, depth, &head);
        }

        line(out, depth, &format!("{} (", head))?;
        let inner = depth + 1;
        if let Some(color_space) = &meta.color_space {
            line(out, inner, &format!("colorSpace = {}", quote(color_space)))?;
        }
        if meta.default.is_some() || meta.range.is_some() {
            line(out, inner, "customData = {")?;
            if let Some(default) = &meta.default {
                line(
                    out,
                    inner + 1,
                    &format!("{} default = {}", default.type_name(), default),
                )?;
            }
            if let Some((min, max)) = meta.range {
                line(out, inner + 1, "dictionary range = {")?;
                line(out, inner + 2, &format!("{} max = {}", type_name, max))?;
                line(out, inner + 2, &format!("{} min = {}", type_name, min))?;
                line(out, inner + 1, "}")?;
            }
            line(out, inner, "}")?;
        }
        if let Some(group) = &meta.display_group {
            line(out, inner, &format!("displayGroup = {}", quote(group)))?;
        }
        if let Some(name) = &meta.display_name {
            line(out, inner, &format!("displayName = {}", quote(name)))?;
        }
        if let Some(doc) = &meta.doc {
            line(out, inner, &format!("doc = {}", quote(doc)))?;
        }
        if let Some(hidden) = meta.hidden {
            line(out, inner, &format!("hidden = {}", hidden))?;
        }
        line(out, depth, ")")
    }
}

/// Override block `over "mat_<key>"` with its shader inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialOverride {
    pub key: IdentityKey,
    pub inputs: Vec<ShaderInput>,
}

impl MaterialOverride {
    pub fn new(key: IdentityKey) -> Self {
        Self {
            key,
            inputs: Vec::new(),
        }
    }

    pub fn input(&self, name: &str) -> Option<&ShaderInput> {
        self.inputs.iter().find(|input| input.name == name)
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|input| input.name.as_str())
    }

    fn render(&self, out: &mut String, depth: usize) -> fmt::Result {
        line(out, depth, &format!("over {}", quote(&self.key.material_name())))?;
        line(out, depth, "{")?;
        line(out, depth + 1, &format!("over {}", quote(SHADER_PRIM)))?;
        line(out, depth + 1, "{")?;
        for input in &self.inputs {
            input.render(out, depth + 2)?;
        }
        line(out, depth + 1, "}")?;
        line(out, depth, "}")
    }
}

/// An ordered set of material overrides, at most one per identity key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideDocument {
    materials: Vec<MaterialOverride>,
}

impl OverrideDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a material; a block for an already present key is dropped.
    ///
    /// Returns `false` if the material was dropped.
    pub fn push(&mut self, material: MaterialOverride) -> bool {
        if self.material(&material.key).is_some() {
            tracing::debug!("Dropping duplicate material {}", material.key);
            return false;
        }
        self.materials.push(material);
        true
    }

    pub fn material(&self, key: &IdentityKey) -> Option<&MaterialOverride> {
        self.materials.iter().find(|material| &material.key == key)
    }

    pub fn materials(&self) -> &[MaterialOverride] {
        &self.materials
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Render the layer as USDA text.
    pub fn to_usda(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render(&mut out);
        out
    }

    fn render(&self, out: &mut String) -> fmt::Result {
        out.push_str("#usda 1.0\n");
        out.push_str("(\n");
        line(out, 1, "upAxis = \"Y\"")?;
        out.push_str(")\n\n");

        line(out, 0, &format!("def Scope {}", quote(LOOKS_SCOPE)))?;
        line(out, 0, "{")?;
        line(out, 0, "}")?;
        out.push('\n');

        line(out, 0, &format!("over {}", quote(ROOT_PRIM)))?;
        line(out, 0, "{")?;
        line(out, 1, &format!("over {}", quote(LOOKS_SCOPE)))?;
        line(out, 1, "{")?;
        for (idx, material) in self.materials.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            material.render(out, 2)?;
        }
        line(out, 1, "}")?;
        line(out, 0, "}")
    }
}

fn line(out: &mut String, depth: usize, text: &str) -> fmt::Result {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    writeln!(out, "{}", text)
}

/// Quote a USDA string literal.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
