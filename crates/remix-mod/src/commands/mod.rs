mod config;
mod generate;
mod inspect;

pub use config::{reset_config, show_config};
pub use generate::{generate_mod, CollisionPolicyArg, GenerateArgs};
pub use inspect::{inspect_texture, InspectTextureArgs};
