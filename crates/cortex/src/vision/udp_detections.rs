use crate::types::{BoundingBox, Detection, DetectionFrame, EntityKey, Hand, RecognitionKind, ZoneHint};
use anyhow::Result;
use circuitfarm_kernel::Point;
use crossbeam_channel::Sender;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("empty message")]
    Empty,
    #[error("invalid JSON frame: {0}")]
    Json(String),
    #[error("malformed token '{0}'")]
    Token(String),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("unknown kind '{0}'")]
    UnknownKind(String),
    #[error("unknown hand '{0}'")]
    UnknownHand(String),
    #[error("invalid value for '{key}': {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Deserialize)]
struct JsonFrame {
    kind: RecognitionKind,
    #[serde(default)]
    detections: Vec<JsonDetection>,
}

#[derive(Debug, Deserialize)]
struct JsonDetection {
    name: String,
    #[serde(default)]
    hand: Option<String>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    x: Option<f32>,
    #[serde(default)]
    y: Option<f32>,
    #[serde(default)]
    w: Option<f32>,
    #[serde(default)]
    h: Option<f32>,
    #[serde(default)]
    bbox: Option<[f32; 4]>,
}

/// Parse one datagram into a detector frame.
///
/// JSON:
/// `{"kind":"gesture","detections":[{"name":"ILoveYou","hand":"Left","x":0.1,"y":0.6}]}`
/// `{"kind":"object","detections":[{"name":"orange","bbox":[900,420,60,60],"confidence":0.8}]}`
///
/// k=v, detections separated by `;`:
/// `kind=gesture name=Victory hand=Right x=0.2 y=0.5; name=ILoveYou hand=Left x=0.1 y=0.6`
/// `kind=object name=orange conf=0.8 bbox=900,420,60,60`
/// `kind=object name=clock conf=0.8 x=500 y=100 w=100 h=100`
///
/// `x`/`y` in 0..=1 are normalised, anything larger is pixels. In k=v form a
/// `+` in a name stands for a space (`name=teddy+bear`). A message with only
/// a kind is an empty frame.
pub fn parse_detection_message(msg: &str) -> Result<DetectionFrame, ParseError> {
    let msg = msg.trim();
    if msg.is_empty() {
        return Err(ParseError::Empty);
    }

    let (kind, raw) = if msg.starts_with('{') {
        let frame: JsonFrame = serde_json::from_str(msg).map_err(|e| ParseError::Json(e.to_string()))?;
        (frame.kind, frame.detections)
    } else {
        parse_kv(msg)?
    };

    let detections = raw
        .into_iter()
        .enumerate()
        .map(|(i, d)| into_detection(kind, i, d))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DetectionFrame::new(kind, detections))
}

fn parse_kv(msg: &str) -> Result<(RecognitionKind, Vec<JsonDetection>), ParseError> {
    let mut kind = None;
    let mut detections = Vec::new();

    for chunk in msg.split(';') {
        let mut d = JsonDetection {
            name: String::new(),
            hand: None,
            index: None,
            confidence: None,
            x: None,
            y: None,
            w: None,
            h: None,
            bbox: None,
        };
        let mut has_fields = false;

        for tok in chunk.split_whitespace() {
            let (k, v) = tok.split_once('=').ok_or_else(|| ParseError::Token(tok.to_string()))?;
            match k {
                "kind" => {
                    kind = Some(match v {
                        "gesture" => RecognitionKind::Gesture,
                        "object" => RecognitionKind::Object,
                        other => return Err(ParseError::UnknownKind(other.to_string())),
                    });
                    continue;
                }
                "name" | "label" => d.name = v.replace('+', " "),
                "hand" => d.hand = Some(v.to_string()),
                "index" | "i" => d.index = Some(number("index", v)?),
                "conf" | "confidence" => d.confidence = Some(number("confidence", v)?),
                "x" => d.x = Some(number("x", v)?),
                "y" => d.y = Some(number("y", v)?),
                "w" | "width" => d.w = Some(number("w", v)?),
                "h" | "height" => d.h = Some(number("h", v)?),
                "bbox" => {
                    let parts = v
                        .split(',')
                        .map(|p| number("bbox", p))
                        .collect::<Result<Vec<f32>, _>>()?;
                    let bbox: [f32; 4] = parts.try_into().map_err(|_| ParseError::InvalidValue {
                        key: "bbox",
                        value: v.to_string(),
                    })?;
                    d.bbox = Some(bbox);
                }
                _ => {}
            }
            has_fields = true;
        }

        if has_fields {
            if d.name.is_empty() {
                return Err(ParseError::MissingField("name"));
            }
            detections.push(d);
        }
    }

    Ok((kind.ok_or(ParseError::MissingField("kind"))?, detections))
}

fn number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn into_detection(kind: RecognitionKind, position: usize, d: JsonDetection) -> Result<Detection, ParseError> {
    let entity = match kind {
        RecognitionKind::Gesture => {
            let raw = d.hand.ok_or(ParseError::MissingField("hand"))?;
            EntityKey::Hand(Hand::parse(&raw).ok_or(ParseError::UnknownHand(raw))?)
        }
        RecognitionKind::Object => EntityKey::object(d.name.clone(), d.index.unwrap_or(position)),
    };

    let bbox = d.bbox.or(match (d.x, d.y, d.w, d.h) {
        (Some(x), Some(y), Some(w), Some(h)) => Some([x, y, w, h]),
        _ => None,
    });
    let hint = match (bbox, d.x, d.y) {
        (Some([x, y, width, height]), _, _) => Some(ZoneHint::Bbox(BoundingBox { x, y, width, height })),
        (None, Some(x), Some(y)) if (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y) => {
            Some(ZoneHint::Normalized { x, y })
        }
        (None, Some(x), Some(y)) => Some(ZoneHint::Point(Point::new(x as i32, y as i32))),
        _ => None,
    };

    Ok(Detection {
        entity,
        name: d.name,
        confidence: d.confidence.unwrap_or(1.0).clamp(0.0, 1.0),
        hint,
    })
}

/// Pause after a failed receive
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Bind `bind_addr` and forward every parsed datagram as a frame.
pub async fn spawn_udp_detection_task(
    bind_addr: SocketAddr,
    frames: Sender<DetectionFrame>,
) -> Result<JoinHandle<()>> {
    let sock = UdpSocket::bind(bind_addr).await?;
    log::info!("UDP detection listener bound on {bind_addr}");

    let task = tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            let (len, src) = match sock.recv_from(&mut buf).await {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("UDP detection recv error: {e}");
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    continue;
                }
            };

            let Ok(s) = std::str::from_utf8(&buf[..len]) else {
                log::warn!("Non UTF-8 datagram from {src}");
                continue;
            };
            match parse_detection_message(s) {
                Ok(frame) => {
                    if frames.send(frame).is_err() {
                        log::info!("Frame receiver dropped, stopping UDP listener");
                        break;
                    }
                }
                Err(e) => log::warn!("Bad detection message from {src}: {e}"),
            }
        }
    });

    Ok(task)
}
