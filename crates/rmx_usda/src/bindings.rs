//! Role → shader input bindings.
//!
//! [`ShaderBindings`] is the lookup table that decides which `inputs:*`
//! attributes a texture role contributes to a material, in what order, and
//! with which authoring metadata.

use rmx_texture::{AssetGroup, TextureRole};

use crate::document::{InputMetadata, InputValue, MaterialOverride, ShaderInput};

/// How an input's value is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingValue {
    /// The role's texture, as an asset path relative to the document.
    Texture,
    Fixed(InputValue),
}

/// Template for one shader input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    pub name: String,
    pub value: BindingValue,
    pub metadata: InputMetadata,
}

impl InputBinding {
    pub fn texture(name: impl Into<String>, metadata: InputMetadata) -> Self {
        Self {
            name: name.into(),
            value: BindingValue::Texture,
            metadata,
        }
    }

    pub fn fixed(name: impl Into<String>, value: InputValue, metadata: InputMetadata) -> Self {
        Self {
            name: name.into(),
            value: BindingValue::Fixed(value),
            metadata,
        }
    }
}

/// Inputs contributed by one role, or by every material when `role` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleBinding {
    pub role: Option<TextureRole>,
    pub inputs: Vec<InputBinding>,
}

/// Ordered table of role bindings.
///
/// Inputs are emitted in table order, so the same group always renders the
/// same block.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderBindings {
    bindings: Vec<RoleBinding>,
}

impl ShaderBindings {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: TextureRole, inputs: Vec<InputBinding>) -> Self {
        self.bindings.push(RoleBinding {
            role: Some(role),
            inputs,
        });
        self
    }

    /// Inputs written into every material regardless of its roles.
    pub fn with_fixed(mut self, inputs: Vec<InputBinding>) -> Self {
        self.bindings.push(RoleBinding { role: None, inputs });
        self
    }

    /// The RTX Remix `AperturePBR_Opacity` bindings.
    pub fn remix() -> Self {
        let no_default_asset = || Some(InputValue::Asset(String::new()));

        Self::new()
            .with_role(
                TextureRole::Identity,
                vec![InputBinding::texture(
                    "diffuse_texture",
                    InputMetadata {
                        default: no_default_asset(),
                        display_group: Some("Diffuse".into()),
                        display_name: Some("Albedo Map".into()),
                        doc: Some(
                            "The texture specifying the albedo value and the optional opacity value to use in the alpha channel"
                                .into(),
                        ),
                        hidden: Some(false),
                        ..Default::default()
                    },
                )],
            )
            .with_role(
                TextureRole::Emissive,
                vec![
                    InputBinding::texture(
                        "emissive_mask_texture",
                        InputMetadata {
                            color_space: Some("auto".into()),
                            default: no_default_asset(),
                            display_group: Some("Emissive".into()),
                            display_name: Some("Emissive Mask Map".into()),
                            doc: Some("The texture masking the emissive color".into()),
                            hidden: Some(false),
                            ..Default::default()
                        },
                    ),
                    InputBinding::fixed(
                        "enable_emission",
                        InputValue::Bool(true),
                        InputMetadata {
                            default: Some(InputValue::Bool(false)),
                            display_group: Some("Emissive".into()),
                            display_name: Some("Enable Emission".into()),
                            doc: Some("Enables the emission of light from the material".into()),
                            hidden: Some(false),
                            ..Default::default()
                        },
                    ),
                    InputBinding::fixed(
                        "emissive_intensity",
                        InputValue::Float(5.0),
                        InputMetadata {
                            default: Some(InputValue::Float(40.0)),
                            range: Some((0.0, 65504.0)),
                            display_group: Some("Emissive".into()),
                            display_name: Some("Emissive Intensity".into()),
                            doc: Some("Intensity of the emission".into()),
                            hidden: Some(false),
                            ..Default::default()
                        },
                    ),
                ],
            )
            .with_fixed(vec![InputBinding::fixed(
                "encoding",
                InputValue::Int(0),
                InputMetadata::default(),
            )])
            .with_role(
                TextureRole::Metallic,
                vec![InputBinding::texture(
                    "metallic_texture",
                    InputMetadata {
                        color_space: Some("auto".into()),
                        default: no_default_asset(),
                        display_group: Some("Specular".into()),
                        display_name: Some("Metallic Map".into()),
                        hidden: Some(false),
                        ..Default::default()
                    },
                )],
            )
            .with_role(
                TextureRole::Normal,
                vec![InputBinding::texture(
                    "normalmap_texture",
                    InputMetadata::default(),
                )],
            )
            .with_role(
                TextureRole::Rough,
                vec![InputBinding::texture(
                    "reflectionroughness_texture",
                    InputMetadata {
                        color_space: Some("auto".into()),
                        default: no_default_asset(),
                        display_group: Some("Specular".into()),
                        display_name: Some("Roughness Map".into()),
                        hidden: Some(false),
                        ..Default::default()
                    },
                )],
            )
    }

    /// Build the override block for `group`, limited to the roles accepted by
    /// `include`. Fixed inputs are always written; roles the group has no
    /// file for are omitted entirely.
    pub fn material<F>(&self, group: &AssetGroup, include: F) -> MaterialOverride
    where
        F: Fn(TextureRole) -> bool,
    {
        let mut material = MaterialOverride::new(group.key.clone());

        for binding in &self.bindings {
            let texture = match binding.role {
                None => None,
                Some(role) if include(role) => match group.file(role) {
                    Some(file) => Some(file),
                    None => continue,
                },
                Some(_) => continue,
            };

            for input in &binding.inputs {
                let value = match (&input.value, texture) {
                    (BindingValue::Fixed(value), _) => value.clone(),
                    (BindingValue::Texture, Some(file)) => {
                        InputValue::Asset(format!("./{}", file.asset_path()))
                    }
                    // A texture binding on a fixed row has nothing to point at.
                    (BindingValue::Texture, None) => continue,
                };
                material.inputs.push(
                    ShaderInput::new(input.name.clone(), value).with_metadata(input.metadata.clone()),
                );
            }
        }

        material
    }

    /// Names of every input a role can contribute.
    pub fn input_names(&self, role: TextureRole) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|binding| binding.role == Some(role))
            .flat_map(|binding| binding.inputs.iter().map(|input| input.name.as_str()))
            .collect()
    }
}

impl Default for ShaderBindings {
    fn default() -> Self {
        Self::remix()
    }
}
