mod chat_panel;
mod config_error_card;
mod loading_card;
mod login_form;
mod organization_selector;

use std::rc::Rc;

pub use chat_panel::ChatPanel;
pub use config_error_card::ConfigErrorCard;
pub use loading_card::LoadingCard;
pub use login_form::LoginForm;
pub use organization_selector::OrganizationSelector;
use tether_core::auth::AuthProvider;
use yew::{Html, Properties, function_component, html};

/// Auth backend handle usable as a prop; equal when it is the same
/// backend.
#[derive(Clone)]
pub struct AuthHandle(Rc<dyn AuthProvider>);

impl AuthHandle {
    pub fn new(auth: Rc<dyn AuthProvider>) -> Self {
        Self(auth)
    }

    pub fn get(&self) -> Rc<dyn AuthProvider> {
        self.0.clone()
    }
}

impl PartialEq for AuthHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Properties, PartialEq)]
pub struct StartupErrorProps {
    pub message: String,
}

#[function_component(StartupError)]
pub fn startup_error(props: &StartupErrorProps) -> Html {
    html! {
        <div class="card error">
            <div class="header">{ "Tether Chat is misconfigured" }</div>
            <div class="muted">{ &props.message }</div>
        </div>
    }
}
