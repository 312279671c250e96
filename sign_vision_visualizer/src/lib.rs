// THEORY:
// The visualizer mirrors the live viewer into a browser. The capture loop
// stays synchronous; it only ever pushes into a `FrameBus`, whose broadcast
// channels never block the sender. Browsers connect over a WebSocket and get
// two kinds of messages: binary JPEG frames (already annotated) and JSON
// `Readout`s, the same "big label + confidence" panel the browser-only
// deployment of the recognizer showed.
//
// The HTTP side is behind the `web` feature so the viewer can be built
// without pulling in a server stack.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use sign_vision::pipeline::FrameReport;
use tokio::sync::broadcast;

/// The browser readout uses a stricter threshold than the on-frame overlay.
pub const DEFAULT_WEB_THRESHOLD: f32 = 75.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

const NO_SIGN_TEXT: &str = "---";
const HOLD_CLOSER_TEXT: &str = "(Hold sign close to camera)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Jpeg,
}

#[derive(Debug, Clone)]
pub struct FramePacket {
    pub ts_millis: u64,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub data: Arc<[u8]>,
}

impl FramePacket {
    /// Encodes an interleaved RGB buffer as a JPEG packet stamped with the current time.
    pub fn jpeg(width: u32, height: u32, rgb: &[u8], quality: u8) -> anyhow::Result<Self> {
        let data = encode_jpeg(width, height, rgb, quality)?;
        let ts_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Ok(Self {
            ts_millis,
            width,
            height,
            format: FrameFormat::Jpeg,
            data: data.into(),
        })
    }
}

pub fn encode_jpeg(width: u32, height: u32, rgb: &[u8], quality: u8) -> anyhow::Result<Vec<u8>> {
    let expected = width as usize * height as usize * 3;
    anyhow::ensure!(
        rgb.len() == expected,
        "expected {expected} RGB bytes for {width}x{height}, got {}",
        rgb.len()
    );
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode(
        rgb,
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

/// What the browser shows under the video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readout {
    pub prediction_text: String,
    pub confidence_text: String,
    pub class_id: Option<usize>,
    pub confidence_percent: f32,
}

impl Readout {
    pub fn from_report(report: &FrameReport, threshold_percent: f32) -> Self {
        let confidence = report.prediction.confidence_percent();
        if confidence > threshold_percent {
            Self {
                prediction_text: report.label.clone(),
                confidence_text: format!("Confidence: {}%", confidence.round() as i64),
                class_id: Some(report.prediction.class_id),
                confidence_percent: confidence,
            }
        } else {
            Self {
                prediction_text: NO_SIGN_TEXT.to_string(),
                confidence_text: HOLD_CLOSER_TEXT.to_string(),
                class_id: None,
                confidence_percent: confidence,
            }
        }
    }
}

#[derive(Clone)]
pub struct FrameBus {
    pub frames_tx: broadcast::Sender<FramePacket>,
    pub readout_tx: broadcast::Sender<Readout>,
}

impl FrameBus {
    pub fn new(capacity: usize) -> Self {
        let (frames_tx, _) = broadcast::channel::<FramePacket>(capacity.max(1));
        let (readout_tx, _) = broadcast::channel::<Readout>(capacity.max(1));
        Self {
            frames_tx,
            readout_tx,
        }
    }

    /// Returns how many viewers received the frame; zero viewers is fine.
    pub fn publish_frame(&self, packet: FramePacket) -> usize {
        self.frames_tx.send(packet).unwrap_or(0)
    }

    pub fn publish_readout(&self, readout: Readout) -> usize {
        self.readout_tx.send(readout).unwrap_or(0)
    }

    pub fn has_viewers(&self) -> bool {
        self.frames_tx.receiver_count() > 0 || self.readout_tx.receiver_count() > 0
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[cfg(feature = "web")]
pub async fn start_server(
    bus: FrameBus,
    cfg: ServerConfig,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    use anyhow::Context;
    use axum::extract::State;
    use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
    use axum::response::{Html, IntoResponse};
    use axum::routing::get;
    use axum::Router;
    use futures_util::{SinkExt, StreamExt};
    use tokio::sync::broadcast::error::RecvError;

    const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Traffic Sign Recognition</title></head>
<body style="font-family:sans-serif; background:#111; color:#eee; text-align:center">
    <h2>Traffic Sign Recognition</h2>
    <img id="frame" width="640" height="480" style="border:1px solid #444; background:#000">
    <h1 id="prediction-text">---</h1>
    <p id="confidence-text">(Hold sign close to camera)</p>
    <p id="status" style="font-family:monospace; font-size:12px; color:#777">connecting</p>
    <script src="/client.js"></script>
</body>
</html>"#;

    const CLIENT_JS: &str = r#"(function(){
        const status = (t)=>{ document.getElementById('status').textContent = t; };
        const img = document.getElementById('frame');
        const predText = document.getElementById('prediction-text');
        const confText = document.getElementById('confidence-text');
        let lastUrl = null;
        const ws = new WebSocket((location.protocol==='https:'?'wss://':'ws://')+location.host+'/ws');
        ws.binaryType = 'arraybuffer';
        ws.onopen = ()=> status('connected');
        ws.onclose = ()=> status('disconnected');
        ws.onmessage = (ev)=>{
            if(ev.data instanceof ArrayBuffer){
                const url = URL.createObjectURL(new Blob([ev.data], {type:'image/jpeg'}));
                img.src = url;
                if(lastUrl){ URL.revokeObjectURL(lastUrl); }
                lastUrl = url;
                return;
            }
            const readout = JSON.parse(ev.data);
            predText.textContent = readout.prediction_text;
            confText.textContent = readout.confidence_text;
        };
    })();"#;

    async fn ws_handler(ws: WebSocketUpgrade, State(bus): State<FrameBus>) -> impl IntoResponse {
        ws.on_upgrade(move |socket| stream_to_viewer(socket, bus))
    }

    async fn stream_to_viewer(socket: WebSocket, bus: FrameBus) {
        let mut frames = bus.frames_tx.subscribe();
        let mut readouts = bus.readout_tx.subscribe();
        let (mut ws_tx, mut ws_rx) = socket.split();
        log::info!("viewer connected");

        loop {
            let outgoing = tokio::select! {
                frame = frames.recv() => match frame {
                    Ok(pkt) => Message::Binary(pkt.data.to_vec()),
                    Err(RecvError::Lagged(skipped)) => {
                        log::debug!("viewer lagged, skipped {skipped} frames");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                readout = readouts.recv() => match readout {
                    Ok(r) => match serde_json::to_string(&r) {
                        Ok(json) => Message::Text(json),
                        Err(e) => {
                            log::warn!("could not serialise readout: {e}");
                            continue;
                        }
                    },
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                incoming = ws_rx.next() => match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                },
            };
            if ws_tx.send(outgoing).await.is_err() {
                break;
            }
        }
        log::info!("viewer disconnected");
    }

    let app = Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/client.js", get(|| async {
            ([(axum::http::header::CONTENT_TYPE, "application/javascript")], CLIENT_JS)
        }))
        .route("/healthz", get(|| async { "ok" }))
        .route("/ws", get(ws_handler))
        .with_state(bus);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding visualizer to {}", cfg.bind_addr))?;
    log::info!("Visualizer listening on http://{}", cfg.bind_addr);

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("visualizer server stopped: {e}");
        }
    });

    Ok(server)
}

#[cfg(not(feature = "web"))]
pub async fn start_server(
    _bus: FrameBus,
    _cfg: ServerConfig,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    Err(anyhow::anyhow!("web feature not enabled for sign_vision_visualizer"))
}
