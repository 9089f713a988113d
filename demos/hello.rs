use anyhow::Result;
use hostview::backend::headless::HeadlessBackend;
use hostview::config::{Rgba, ViewConfig};
use hostview::dialog::{DialogFlags, DialogKind};
use hostview::event::BackendEvent;
use hostview::View;

fn main() -> Result<()> {
    env_logger::init();

    // Configure the window. An empty URL loads the built-in empty document,
    // so everything shown comes from the scripts we inject below.
    let config = ViewConfig {
        title: "hello".to_string(),
        width: 480,
        height: 320,
        ..Default::default()
    };

    // Set up a backend. This example uses the headless backend, which records
    // operations instead of opening a native window; the remote plays the
    // role of the page.
    let backend = HeadlessBackend::new();
    let remote = backend.remote();

    let mut view = View::with_backend(config, Box::new(backend));
    view.open()?;

    // Style the empty document and paint the window background.
    view.inject_css("body { font-family: sans-serif; } #app { margin: 2em; }")?;
    view.set_color(Rgba::new(240, 240, 240, 255));

    // Dialogs block the loop and return the user's answer. The remote scripts
    // what the "user" picks.
    remote.push_dialog_answer("/tmp/hello.css");
    let picked = view.dialog(
        DialogKind::Open,
        DialogFlags::empty(),
        "Pick a stylesheet",
        "",
    )?;
    println!("user picked: {}", picked);

    // Pretend the user closed the window, then pump the loop to completion.
    remote.post(BackendEvent::CloseRequested);
    view.run()?;

    println!("evaluated {} scripts", remote.evaluated_scripts().len());
    Ok(())
}
