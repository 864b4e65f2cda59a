//! `viam-components` – typed clients for hardware components.
//!
//! Each module holds one adapter: a method table (`SERVICE`) and a client
//! struct bound to a single named component. Clients are cheap to clone and
//! perform no I/O until a method is called.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use viam_components::MotorClient;
//! use viam_rpc::{ClientOptions, ConnectChannel};
//!
//! # async fn run() -> Result<(), viam_rpc::ViamError> {
//! let channel = Arc::new(ConnectChannel::new("http://localhost:8080"));
//! let motor = MotorClient::new(channel, "left-wheel", ClientOptions::default());
//! motor.set_power(0.5, None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`arm`], [`base`], [`gantry`], [`gripper`], [`motor`], [`servo`] –
//!   actuators.
//! - [`board`] – GPIO, PWM, analog I/O and interrupt tick streams.
//! - [`camera`] – images, rendered frames and point clouds.
//! - [`encoder`], [`movement_sensor`], [`pose_tracker`], [`power_sensor`],
//!   [`sensor`] – measurement devices.
//! - [`input_controller`] – gamepads and joysticks, including event streams.
//! - [`generic`] – components reachable only through `do_command`.

pub mod arm;
pub mod base;
pub mod board;
pub mod camera;
pub mod encoder;
pub mod gantry;
pub mod generic;
pub mod gripper;
pub mod input_controller;
pub mod motor;
pub mod movement_sensor;
pub mod pose_tracker;
pub mod power_sensor;
pub mod sensor;
pub mod servo;
mod shared;

pub use arm::ArmClient;
pub use base::{BaseClient, BaseProperties};
pub use board::{AnalogValue, BoardClient, PowerMode, Tick};
pub use camera::{CameraClient, CameraProperties, HttpBody, ImageFormat, NamedImage, ResponseMetadata};
pub use encoder::{EncoderClient, EncoderProperties, PositionType};
pub use gantry::GantryClient;
pub use generic::GenericComponentClient;
pub use gripper::GripperClient;
pub use input_controller::{EventSubscription, InputControllerClient, InputEvent};
pub use motor::{MotorClient, MotorProperties};
pub use movement_sensor::{Accuracy, MovementSensorClient, MovementSensorProperties};
pub use pose_tracker::PoseTrackerClient;
pub use power_sensor::PowerSensorClient;
pub use sensor::SensorClient;
pub use servo::ServoClient;
