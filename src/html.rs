//! Shared HTML building blocks: the page layout, form inputs, styles and number formatting.

use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, html};
use numfmt::{Formatter, Precision};

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

pub const BUTTON_SECONDARY_STYLE: &str = "py-1 px-3 text-sm font-medium \
    text-gray-900 bg-white rounded border border-gray-200 hover:bg-gray-100 \
    dark:bg-gray-800 dark:text-gray-400 dark:border-gray-600 \
    dark:hover:text-white dark:hover:bg-gray-700";

pub const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 \
    dark:text-red-500 dark:hover:text-red-400 underline bg-transparent \
    border-none cursor-pointer";

// Form styles
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Budget Tracker" }
                link href="/static/main.css" rel="stylesheet";

                script src="https://unpkg.com/htmx.org@2.0.8" {}
                script src="https://unpkg.com/htmx-ext-sse@2.2.2/sse.js" {}
                script src="https://unpkg.com/htmx-ext-response-targets@2.0.4/response-targets.js" {}

                style
                {
                    r#"
                    #indicator.htmx-indicator {
                        display: none;
                    }

                    #indicator.htmx-request .htmx-indicator {
                        display: inline;
                    }
                    "#
                }
            }

            body
                class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
                hx-ext="response-targets"
            {
                (content)

                // Alert container for out-of-band swaps
                div
                    id="alert-container"
                    class="w-full max-w-md px-4"
                    style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
                {}
            }
        }
    }
}

/// A full page for an error, e.g. a 404, with a link back to the dashboard.
pub fn error_view(title: &str, status: &str, description: &str, fix: &str) -> Markup {
    let content = html! {
        main class="flex flex-col items-center px-4 py-16 mx-auto max-w-screen-sm text-center"
        {
            h1 class="mb-4 text-7xl lg:text-9xl font-extrabold text-blue-600 dark:text-blue-500"
            {
                (status)
            }

            p class="mb-4 text-3xl font-bold text-gray-900 dark:text-white" { (description) }
            p class="mb-4 text-xl text-gray-900 dark:text-white" { (fix) }

            a href="/" class={ (BUTTON_PRIMARY_STYLE) " my-4 max-w-xs" } { "Back to Dashboard" }
        }
    };

    base(title, &content)
}

/// The card layout shared by the log-in and registration pages.
pub fn log_in_register(form_title: &str, form: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            p class="mb-6 text-2xl font-semibold text-gray-900 dark:text-white" { "Budget Tracker" }

            div class="w-full sm:max-w-md p-6 sm:p-8 space-y-6 bg-white dark:bg-gray-800
                rounded-lg shadow dark:border dark:border-gray-700"
            {
                h1 class="text-xl md:text-2xl font-bold text-gray-900 dark:text-white"
                {
                    (form_title)
                }

                (form)
            }
        }
    }
}

/// A labelled input followed by its error message, if any.
fn labelled_input(label: &str, input: Markup, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label class=(FORM_LABEL_STYLE)
            {
                (label)
                (input)
            }

            @if let Some(error_message) = error_message {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

pub fn email_input(email: &str, error_message: Option<&str>) -> Markup {
    let input = html! {
        input
            type="email"
            name="email"
            id="email"
            placeholder="name@example.com"
            class={ "mt-2 " (FORM_TEXT_INPUT_STYLE) }
            required
            autofocus
            value=(email);
    };

    labelled_input("Email", input, error_message)
}

/// A password input. A `min_length` of zero leaves the length unchecked in the browser.
pub fn password_input(
    name: &str,
    label: &str,
    min_length: u8,
    error_message: Option<&str>,
) -> Markup {
    let input = html! {
        input
            type="password"
            name=(name)
            id=(name)
            placeholder="••••••••"
            class={ "mt-2 " (FORM_TEXT_INPUT_STYLE) }
            required
            minlength=[(min_length > 0).then_some(min_length)];
    };

    labelled_input(label, input, error_message)
}

/// A small spinning ring for buttons waiting on a request.
pub fn loading_spinner() -> Markup {
    html! {
        span
            role="status"
            aria-label="Loading"
            class="inline-block w-4 h-4 me-2 align-middle rounded-full border-2
                border-gray-200 border-t-current animate-spin"
        {}
    }
}

pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .expect("'$' is a valid currency prefix")
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .expect("'-$' is a valid currency prefix")
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "$0.00".to_owned()
    };

    // numfmt omits trailing zeros, e.g. "12.30" is rendered as "12.3" and "12.00" as "12".
    match formatted_string.rfind('.') {
        Some(dot) => {
            let decimals = formatted_string.len() - dot - 1;
            for _ in decimals..2 {
                formatted_string.push('0');
            }
        }
        None => formatted_string.push_str(".00"),
    }

    formatted_string
}

/// Format a percentage with one decimal place, e.g. "5.0%".
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.1}%")
}

#[cfg(test)]
mod tests {
    use super::{format_currency, format_percentage};

    #[test]
    fn formats_currency_with_two_decimals() {
        assert_eq!(format_currency(12.3), "$12.30");
        assert_eq!(format_currency(1000.0), "$1,000.00");
        assert_eq!(format_currency(-50.0), "-$50.00");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(12.34), "$12.34");
    }

    #[test]
    fn formats_percentage_with_one_decimal() {
        assert_eq!(format_percentage(5.0), "5.0%");
        assert_eq!(format_percentage(33.333), "33.3%");
    }
}
