//! # Skyisle
//!
//! A skinned-character viewer over an endless, procedurally tiled world.
//!
//! ## Features
//!
//! - **Skeletal Animation**: Flat-array node hierarchy, skin binding, keyframe sampling
//!   with looping playback and a per-frame joint matrix palette
//! - **Infinite World**: A 3×3 grid of terrain tiles that streams around the camera
//! - **Fly Camera**: Explicit camera state with view / projection matrices
//! - **glTF Import**: Skeletons, skins and animation clips from glTF files (feature `gltf`)
//!
//! ## Architecture Design
//!
//! This crate follows the **Anemic Domain Model (贫血模型)** pattern:
//! - **State (Component / Resource)**: Pure data structures storing system state
//! - **Service**: Business logic encapsulation with static methods
//! - **System**: ECS systems for orchestration and scheduling
//!
//! ### Example
//!
//! ```no_run
//! use skyisle::config::ViewerConfig;
//! use skyisle::core::Viewer;
//! use skyisle::scene::CameraMove;
//!
//! let mut viewer = Viewer::new(ViewerConfig::default()).unwrap();
//! viewer
//!     .run_headless(600, 1.0 / 60.0, |_, camera| camera.move_camera(CameraMove::Forward))
//!     .unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Viewer loop, resources and error types
//! - [`animation`]: Skeleton, skin, sampler and pose updater
//! - [`scene`]: Camera, tile streaming and terrain scenes
//! - [`config`]: Configuration system

/// Core viewer functionality including the frame loop and error types
pub mod core;
/// Configuration system
pub mod config;
/// Skeletal animation system
pub mod animation;
/// Camera, tile streaming and terrain scenes
pub mod scene;
