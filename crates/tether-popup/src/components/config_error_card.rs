use tether_core::Organization;
use yew::{Callback, Html, Properties, function_component, html};

#[derive(Properties, PartialEq)]
pub struct ConfigErrorCardProps {
    pub organization: Organization,
    pub on_switch: Callback<()>,
    pub on_sign_out: Callback<()>,
}

#[function_component(ConfigErrorCard)]
pub fn config_error_card(props: &ConfigErrorCardProps) -> Html {
    let on_switch = props.on_switch.clone();
    let on_sign_out = props.on_sign_out.clone();

    html! {
        <div class="card error">
            <div class="header">{ "Configuration Error" }</div>
            <p>
                { format!(
                    "Chat configuration is missing for {}. Please contact your administrator.",
                    props.organization.name
                ) }
            </p>
            <div class="actions">
                <button class="btn" onclick={move |_| on_switch.emit(())}>{ "Switch Organization" }</button>
                <button class="btn danger" onclick={move |_| on_sign_out.emit(())}>{ "Sign Out" }</button>
            </div>
        </div>
    }
}
