use dioxus::prelude::*;
use futures_util::{future, SinkExt, StreamExt};
use gloo_net::websocket::{futures::WebSocket, Message as GlooWsMessage};
use lifecanvas_shared::{
    canvas_point, decode_points, encode_points, run_debounced, PixelBuffer, Point, CANVAS_HEIGHT,
    CANVAS_WIDTH, FLUSH_QUIET_PERIOD,
};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

const CANVAS_ID: &str = "life-canvas";

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        div { class: "min-h-screen bg-slate-900 flex flex-col items-center justify-center gap-6",
            h1 { class: "text-3xl font-bold text-white", "LifeCanvas" }
            p { class: "text-slate-400",
                "Drag on the board to add cells. Everyone connected shares the same board."
            }
            Board {}
        }
    }
}

// ws:// or wss:// back to the host that served the page.
fn socket_url() -> Option<String> {
    let location = web_sys::window()?.location();
    let host = location.host().ok()?;
    let scheme = if location.protocol().ok()? == "https:" {
        "wss"
    } else {
        "ws"
    };
    Some(format!("{}://{}/ws", scheme, host))
}

/// Replaces the whole canvas with `frame`.
fn paint(frame: &PixelBuffer) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| JsValue::from_str("canvas is not mounted"))?
        .dyn_into()?;
    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;

    let image = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(frame.as_bytes()),
        frame.width(),
        frame.height(),
    )?;
    context.put_image_data(&image, 0.0, 0.0)
}

fn render_frame(text: &str) {
    let points = match decode_points(text) {
        Ok(points) => points,
        Err(e) => {
            log::warn!("Dropping frame from server: {}", e);
            return;
        }
    };

    let (frame, _) = PixelBuffer::render(CANVAS_WIDTH, CANVAS_HEIGHT, &points);
    if let Err(e) = paint(&frame) {
        log::error!("Failed to paint frame: {:?}", e);
    }
}

#[allow(non_snake_case)]
fn Board() -> Element {
    // True between mousedown and mouseup/mouseleave.
    let mut dragging = use_signal(|| false);

    let input = use_coroutine(move |points: UnboundedReceiver<Point>| async move {
        let Some(ws_url) = socket_url() else {
            log::error!("Could not work out the websocket URL.");
            return;
        };
        let ws = match WebSocket::open(&ws_url) {
            Ok(ws) => ws,
            Err(e) => {
                log::error!("Failed to connect to WebSocket: {:?}", e);
                return;
            }
        };

        let (mut write, mut read) = ws.split();

        // Incoming frames: every message is the whole board.
        spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(GlooWsMessage::Text(text)) => render_frame(&text),
                    Ok(GlooWsMessage::Bytes(_)) => {}
                    Err(e) => {
                        log::error!("WebSocket connection lost: {:?}", e);
                        break;
                    }
                }
            }
        });

        // Outgoing batches
        let (batches_tx, mut batches_rx) = futures_channel::mpsc::unbounded::<Vec<Point>>();
        let batcher = run_debounced(
            points,
            FLUSH_QUIET_PERIOD,
            gloo_timers::future::sleep,
            move |batch| batches_tx.unbounded_send(batch).is_ok(),
        );
        let writer = async move {
            while let Some(batch) = batches_rx.next().await {
                let json_msg = match encode_points(&batch) {
                    Ok(json_msg) => json_msg,
                    Err(e) => {
                        log::error!("Could not encode points: {}", e);
                        continue;
                    }
                };
                if write.send(GlooWsMessage::Text(json_msg)).await.is_err() {
                    log::error!("WebSocket connection closed. Cannot send points.");
                    break;
                }
            }
        };

        future::join(batcher, writer).await;
    });

    let push = move |evt: MouseEvent| {
        let position = evt.element_coordinates();
        if let Some(point) = canvas_point(position.x, position.y, CANVAS_WIDTH, CANVAS_HEIGHT) {
            input.send(point);
        }
    };

    rsx! {
        canvas {
            id: CANVAS_ID,
            width: "{CANVAS_WIDTH}",
            height: "{CANVAS_HEIGHT}",
            class: "border border-slate-600 rounded-md bg-white cursor-crosshair",
            prevent_default: "onmousedown onmousemove",

            onmousedown: move |evt| {
                dragging.set(true);
                push(evt);
            },

            onmousemove: move |evt| {
                if dragging() {
                    push(evt);
                }
            },

            onmouseup: move |_| dragging.set(false),

            onmouseleave: move |_| dragging.set(false),
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    launch(App);
}
