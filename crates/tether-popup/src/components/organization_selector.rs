use tether_core::Organization;
use tether_core::picker::OrganizationPicker;
use web_sys::HtmlSelectElement;
use yew::{Callback, Html, Properties, TargetCast, function_component, html, use_state};

#[derive(Properties, PartialEq)]
pub struct OrganizationSelectorProps {
    pub picker: OrganizationPicker,
    pub on_choose: Callback<Organization>,
    pub on_sign_out: Callback<()>,
}

#[function_component(OrganizationSelector)]
pub fn organization_selector(props: &OrganizationSelectorProps) -> Html {
    let selected_id = use_state(String::new);
    let error = use_state(|| None::<String>);

    let on_change = {
        let selected_id = selected_id.clone();
        let error = error.clone();
        Callback::from(move |event: yew::Event| {
            let select: HtmlSelectElement = event.target_unchecked_into();
            selected_id.set(select.value());
            error.set(None);
        })
    };

    let on_continue = {
        let picker = props.picker.clone();
        let on_choose = props.on_choose.clone();
        let selected_id = selected_id.clone();
        let error = error.clone();
        Callback::from(move |_: yew::MouseEvent| match picker.choose(&selected_id) {
            Ok(organization) => on_choose.emit(organization),
            Err(pick_error) => error.set(Some(pick_error.to_string())),
        })
    };

    let on_sign_out = props.on_sign_out.clone();
    let picker = &props.picker;
    let option = |organization: &Organization, enabled: bool| {
        let label = if enabled {
            organization.name.clone()
        } else {
            format!("{} (not configured)", organization.name)
        };
        html! {
            <option
                value={organization.id.clone()}
                disabled={!enabled}
                selected={*selected_id == organization.id}
            >
                { label }
            </option>
        }
    };

    html! {
        <div class="card picker">
            <div class="header">{ "Select Organization" }</div>
            <div class="muted">{ picker.status_line() }</div>

            {
                if picker.is_empty() {
                    html! {}
                } else {
                    html! {
                        <select onchange={on_change}>
                            <option value="" selected={selected_id.is_empty()}>
                                { "Choose an organization..." }
                            </option>
                            {
                                if picker.show_group_labels() {
                                    html! {
                                        <>
                                            <optgroup label="Available">
                                                { for picker.configured.iter().map(|org| option(org, true)) }
                                            </optgroup>
                                            <optgroup label="Not configured">
                                                { for picker.unconfigured.iter().map(|org| option(org, false)) }
                                            </optgroup>
                                        </>
                                    }
                                } else {
                                    html! {
                                        <>
                                            { for picker.configured.iter().map(|org| option(org, true)) }
                                            { for picker.unconfigured.iter().map(|org| option(org, false)) }
                                        </>
                                    }
                                }
                            }
                        </select>
                    }
                }
            }

            {
                if let Some(message) = (*error).clone() {
                    html! { <div class="error-text">{ message }</div> }
                } else {
                    html! {}
                }
            }

            <div class="actions">
                <button
                    class="btn primary"
                    onclick={on_continue}
                    disabled={picker.configured.is_empty()}
                >
                    { "Continue" }
                </button>
                <button class="btn danger" onclick={move |_| on_sign_out.emit(())}>{ "Sign Out" }</button>
            </div>
        </div>
    }
}
