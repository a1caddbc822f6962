mod api;
mod app;
mod components;
mod runtime;
mod storage;
mod supabase;

use std::rc::Rc;

use tether_core::config::PopupConfig;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!(
    "starting Tether Chat popup"
  );

  let mount = web_sys::window()
    .and_then(|window| {
      window.document()
    })
    .and_then(|document| {
      document.get_element_by_id("app")
    })
    .expect(
      "missing #app mount element"
    );

  match PopupConfig::from_toml_str(
    include_str!("../tether.toml")
  ) {
    | Ok(config) => {
      yew::Renderer::<app::App>::with_root_and_props(
        mount,
        app::AppProps {
          config: Rc::new(config)
        }
      )
      .render();
    }
    | Err(error) => {
      tracing::error!(
        "invalid popup configuration: \
         {error:#}"
      );
      yew::Renderer::<components::StartupError>::with_root_and_props(
        mount,
        components::StartupErrorProps {
          message: format!("{error:#}")
        }
      )
      .render();
    }
  }
}
