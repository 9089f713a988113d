use std::thread;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use hostview::backend::headless::HeadlessBackend;
use hostview::bind::Binding;
use hostview::config::ViewConfig;
use hostview::View;

#[derive(Serialize, Default)]
struct Counter {
    count: i64,
}

fn main() -> Result<()> {
    env_logger::init();

    let backend = HeadlessBackend::new();
    let remote = backend.remote();

    let mut view = View::with_backend(ViewConfig::default(), Box::new(backend));
    view.open()?;

    // Expose a `counter` object to the page. Its `add` stub posts an RPC
    // payload back to us; after each successful call the data is re-synced
    // into the page.
    view.bind(
        Binding::new("counter", Counter::default()).method("add", 1, |c: &mut Counter, params| {
            let Some(n) = params[0].as_i64() else { return false };
            c.count += n;
            true
        }),
    )?;

    // The page side: click handlers would call counter.add(1). The headless
    // remote posts the same payload the generated stub would.
    remote.post_message(r#"{"scope":"counter","method":"add","params":[1]}"#);
    remote.post_message(r#"{"scope":"counter","method":"add","params":[41]}"#);

    // Another thread schedules work onto the loop thread, then stops the
    // loop. This is the only safe way to touch the view from outside it.
    let handle = view.dispatch_handle();
    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.dispatch(|view| {
            view.set_title("done");
            view.terminate();
        });
    });

    view.run()?;
    worker.join().unwrap();

    for script in remote.evaluated_scripts() {
        println!("eval> {}", script);
    }
    Ok(())
}
