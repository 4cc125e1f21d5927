//! Vision pathway: where detection frames come from
//!
//! The hand and object detectors run outside the game. They either send
//! frames over UDP or, without a camera, the scripted detector stands in.
//! Both feed the same channel the game loop drains.

use crate::types::DetectionFrame;
use anyhow::Result;
use crossbeam_channel::Sender;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;

mod simulator;
mod udp_detections;

pub use simulator::{spawn_simulator_task, ScriptTimings, ScriptedDetector};
pub use udp_detections::{parse_detection_message, spawn_udp_detection_task, ParseError};

/// Period of the scripted detector, roughly a 30 fps camera
const SIMULATED_FRAME_PERIOD: Duration = Duration::from_millis(33);

pub struct VisionPathway {
    frames: Sender<DetectionFrame>,
    udp_addr: Option<SocketAddr>,
    simulate: bool,
    started: bool,
    tasks: Vec<JoinHandle<()>>,
}

impl VisionPathway {
    pub fn new(frames: Sender<DetectionFrame>, udp_addr: Option<SocketAddr>, simulate: bool) -> Self {
        if let Some(addr) = udp_addr {
            log::info!("UDP detection input enabled on {addr}");
        }
        if udp_addr.is_none() && !simulate {
            log::warn!("No detection source configured; the game will only see empty frames");
        }
        Self {
            frames,
            udp_addr,
            simulate,
            started: false,
            tasks: Vec::new(),
        }
    }

    /// Start every configured source. Calling it twice is a no-op.
    pub async fn start(&mut self) -> Result<()> {
        if self.started {
            log::warn!("Vision pathway already started");
            return Ok(());
        }
        log::info!("Starting Vision Pathway...");

        if let Some(addr) = self.udp_addr {
            self.tasks.push(spawn_udp_detection_task(addr, self.frames.clone()).await?);
        }
        if self.simulate {
            self.tasks.push(spawn_simulator_task(self.frames.clone(), SIMULATED_FRAME_PERIOD));
        }

        self.started = true;
        Ok(())
    }

    /// Abort every running source. The pathway can be started again.
    pub fn stop(&mut self) {
        log::info!("Stopping Vision Pathway...");
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.started = false;
    }
}
