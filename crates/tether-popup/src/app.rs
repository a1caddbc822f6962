use std::rc::Rc;

use gloo::console::log;
use tether_core::config::PopupConfig;
use tether_core::{
  Action,
  Organization,
  Services,
  View
};
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html,
  use_effect_with,
  use_force_update,
  use_memo
};

use crate::components::{
  AuthHandle,
  ChatPanel,
  ConfigErrorCard,
  LoadingCard,
  LoginForm,
  OrganizationSelector
};
use crate::runtime::PopupRuntime;
use crate::storage::PopupStorage;
use crate::supabase::SupabaseClient;

#[derive(Properties, PartialEq)]
pub struct AppProps {
  pub config: Rc<PopupConfig>
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
  let runtime = use_memo(
    props.config.clone(),
    |config| {
      let storage =
        Rc::new(PopupStorage::detect());
      let client =
        Rc::new(SupabaseClient::new(
          config.clone(),
          storage.clone()
        ));
      PopupRuntime::new(Services::new(
        client.clone(),
        client,
        storage,
        &config.storage.selection_key
      ))
    }
  );
  let trigger = use_force_update();

  {
    let runtime = (*runtime).clone();
    use_effect_with((), move |_| {
      runtime.set_on_change(Some(Rc::new(
        move || trigger.force_update()
      )));

      let subscription = {
        let listener = runtime.clone();
        runtime.services().sessions.subscribe(
          move |session| {
            ui_debug(
              "auth.change",
              if session.is_some() {
                "signed in"
              } else {
                "signed out"
              }
            );
            listener.dispatch(
              Action::SessionChanged(session)
            );
          }
        )
      };
      runtime.dispatch(Action::Started);

      move || {
        runtime.set_on_change(None);
        drop(subscription);
      }
    });
  }

  let dispatch = {
    let runtime = (*runtime).clone();
    Callback::from(move |action: Action| {
      runtime.dispatch(action)
    })
  };
  let on_sign_out = {
    let dispatch = dispatch.clone();
    Callback::from(move |()| {
      ui_debug(
        "button.sign_out.click",
        "sign out requested"
      );
      dispatch.emit(Action::SignOutRequested)
    })
  };
  let on_switch = {
    let dispatch = dispatch.clone();
    Callback::from(move |()| {
      ui_debug(
        "button.switch_org.click",
        "selection cleared"
      );
      dispatch.emit(Action::SelectionCleared)
    })
  };
  let on_retry = {
    let dispatch = dispatch.clone();
    Callback::from(move |()| {
      dispatch.emit(Action::RetryMemberships)
    })
  };
  let on_choose = {
    let dispatch = dispatch.clone();
    Callback::from(
      move |organization: Organization| {
        ui_debug(
          "select.organization",
          &organization.id
        );
        dispatch.emit(
          Action::OrganizationChosen(
            organization
          )
        )
      }
    )
  };

  let body = match runtime.view() {
    | View::Loading { error } => html! {
      <LoadingCard
        {error}
        {on_retry}
        {on_sign_out}
      />
    },
    | View::LoggedOut => html! {
      <LoginForm
        auth={AuthHandle::new(
          runtime.services().auth.clone()
        )}
      />
    },
    | View::PickingOrganization(picker) => {
      html! {
        <OrganizationSelector
          {picker}
          {on_choose}
          {on_sign_out}
        />
      }
    }
    | View::ConfigError(organization) => {
      html! {
        <ConfigErrorCard
          {organization}
          {on_switch}
          {on_sign_out}
        />
      }
    }
    | View::Chatting(launch) => html! {
      <ChatPanel
        {launch}
        settings={props.config.chat.clone()}
        {on_switch}
        {on_sign_out}
      />
    }
  };

  html! {
    <div class="popup">
      <header class="popup-header">
        <span class="brand">{ "Tether Chat" }</span>
        {
          match runtime.signed_in_email() {
            | Some(email) => html! {
              <span class="user-email">{ email }</span>
            },
            | None => html! {}
          }
        }
      </header>
      <main class="popup-body">{ body }</main>
    </div>
  }
}

pub(crate) fn ui_debug(
  event: &str,
  detail: &str
) {
  tracing::debug!(
    event, detail, "ui-debug"
  );
  log!(format!(
    "[ui-debug] {event}: {detail}"
  ));
}
