use super::{Engine, EngineConfig};
use anyhow::{Context, Result};
use wry::application::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use wry::webview::{WebContext, WebViewBuilder};

/// System webview (WebView2, WebKitGTK or WKWebView) in a single native window.
pub(super) struct WryEngine;

impl Engine for WryEngine {
    fn run(&self, config: EngineConfig) -> Result<()> {
        let event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(
                f64::from(config.width),
                f64::from(config.height),
            ))
            .build(&event_loop)
            .context("failed to create window")?;

        let mut context = WebContext::new(Some(config.data_dir.clone()));
        let builder = WebViewBuilder::new(window)
            .context("failed to initialize webview")?
            .with_web_context(&mut context)
            .with_initialization_script(&config.init_script)
            .with_url(&config.address)
            .context("invalid navigation address")?;
        let webview = with_browser_args(builder, &config)
            .build()
            .context("failed to create webview")?;

        // Never returns; closing the window ends the process.
        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Wait;
            let _ = &webview;
            if let Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } = event
            {
                *control_flow = ControlFlow::Exit;
            }
        })
    }
}

#[cfg(windows)]
fn with_browser_args<'a>(builder: WebViewBuilder<'a>, config: &EngineConfig) -> WebViewBuilder<'a> {
    use wry::webview::WebViewBuilderExtWindows;
    // Replaces the engine defaults, so they are repeated here.
    let mut args = String::from("--disable-features=msWebOOUI,msPdfOOUI,msSmartScreenProtection");
    if config.accept_invalid_certs {
        args.push_str(" --ignore-certificate-errors");
    }
    builder.with_additional_browser_args(args)
}

#[cfg(not(windows))]
fn with_browser_args<'a>(builder: WebViewBuilder<'a>, _config: &EngineConfig) -> WebViewBuilder<'a> {
    builder
}
