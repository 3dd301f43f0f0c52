//! Dashboard HTTP handlers and view rendering.
//!
//! The page holds the add transaction form, the bank link card and a live
//! region. The live region is re-rendered on the server and pushed to the
//! browser over server-sent events every time the user's transactions change.

use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{
        IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::StreamExt;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, Session,
    auth::get_user_by_id,
    dashboard::cards::summary_cards,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{
        NewTransactionFormValues, Transaction, TransactionStore, TransactionType,
        new_transaction_form, summarize, transaction_list,
    },
};

const BANK_LINK_SCRIPT: &str = "https://cdn.plaid.com/link/v2/stable/link-initialize.js";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for looking up the user.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The user's transactions.
    pub store: TransactionStore,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            store: state.transaction_store.clone(),
        }
    }
}

/// Display the summary, the add transaction form and the income and expense lists.
pub async fn get_dashboard_page(State(state): State<DashboardState>, session: Session) -> Response {
    let Some(user_id) = session.user_id() else {
        return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_id(user_id, &connection) {
            Ok(user) => user,
            Err(error) => {
                tracing::error!("could not get user {user_id} for dashboard: {error}");
                return error.into_response();
            }
        }
    };

    match state.store.snapshot(&session) {
        Ok(transactions) => dashboard_view(user.email.as_str(), &transactions).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Server-sent `dashboard` events with the re-rendered live region, sent on
/// connect and after every change to the user's transactions.
pub async fn stream_dashboard(State(store): State<TransactionStore>, session: Session) -> Response {
    let subscription = match store.subscribe(&session) {
        Ok(subscription) => subscription,
        Err(error) => return error.into_alert_response(),
    };

    let events = subscription.into_stream().map(|snapshot| {
        let event = match snapshot {
            // Event data must not contain carriage returns.
            Ok(transactions) => Event::default()
                .event("dashboard")
                .data(dashboard_content(&transactions).into_string().replace('\r', "")),
            Err(error) => {
                tracing::error!("could not read transactions for dashboard: {error}");
                Event::default().event("error").data(error.user_message())
            }
        };

        Ok::<_, Infallible>(event)
    });

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

/// The summary cards and the income and expense lists, newest first.
fn dashboard_content(transactions: &[Transaction]) -> Markup {
    let summary = summarize(transactions);

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let (income, expenses): (Vec<&Transaction>, Vec<&Transaction>) = sorted
        .into_iter()
        .partition(|transaction| transaction.kind == TransactionType::Income);

    html! {
        (summary_cards(&summary))

        div class="w-full grid grid-cols-1 lg:grid-cols-2 gap-4"
        {
            (transaction_list("Income", &income, summary.income))
            (transaction_list("Expenses", &expenses, summary.income))
        }
    }
}

fn bank_link_card() -> Markup {
    html! {
        section class="bg-white dark:bg-gray-800 rounded-lg shadow p-6 space-y-4"
        {
            h2 class="text-xl font-bold" { "Bank Import" }

            p class="text-sm text-gray-600 dark:text-gray-400"
            {
                "Link a bank account to import its transactions from the last 30 days."
            }

            button
                id="link-bank-button"
                type="button"
                class=(BUTTON_PRIMARY_STYLE)
                data-link-token-url=(endpoints::BANK_LINK_TOKEN)
                data-import-url=(endpoints::BANK_IMPORT)
            {
                "Link Bank Account"
            }

            p id="bank-link-status" class="text-sm" {}
        }
    }
}

fn dashboard_view(user_email: &str, transactions: &[Transaction]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, user_email).into_html();

    let content = html! {
        (nav_bar)

        div class={ (PAGE_CONTAINER_STYLE) " max-w-screen-xl" }
        {
            div class="w-full grid grid-cols-1 lg:grid-cols-3 gap-4 mb-8"
            {
                div class="lg:col-span-2"
                {
                    (new_transaction_form(&NewTransactionFormValues::default(), None))
                }

                (bank_link_card())
            }

            div
                id="dashboard-live"
                class="w-full"
                hx-ext="sse"
                sse-connect=(endpoints::DASHBOARD_LIVE)
                sse-swap="dashboard"
            {
                (dashboard_content(transactions))
            }
        }

        script src=(BANK_LINK_SCRIPT) {}
        script src="/static/bank_link.js" {}
    };

    base("Dashboard", &content)
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{FromRef, State},
        http::StatusCode,
    };
    use futures::StreamExt;
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        Session, UserId,
        dashboard::handlers::{DashboardState, dashboard_content, get_dashboard_page, stream_dashboard},
        endpoints,
        test_utils::{
            assert_hx_endpoint, assert_status, assert_valid_html, expense, get_header, income,
            must_get_form, parse_html_document, test_app_state, texts_of,
        },
        transaction::{Category, Transaction, TransactionId, TransactionType},
    };

    fn transaction(id: i64, amount: f64, description: &str, hour: u8) -> Transaction {
        let (kind, category) = if amount < 0.0 {
            (TransactionType::Expense, Category::expense("Food").unwrap())
        } else {
            (TransactionType::Income, Category::income())
        };

        Transaction {
            id: TransactionId::new(id),
            amount,
            kind,
            category,
            description: Some(description.to_owned()),
            date: datetime!(2024-01-01 00:00 UTC) + time::Duration::hours(hour.into()),
            user_id: UserId::new(1),
        }
    }

    #[tokio::test]
    async fn page_shows_summary_form_and_lists() {
        let (state, alice) = test_app_state();
        state.transaction_store.create(&alice, income(1000.0)).unwrap();
        state.transaction_store.create(&alice, expense(50.0, "Food")).unwrap();

        let response = get_dashboard_page(State(DashboardState::from_ref(&state)), alice).await;

        assert_status(&response, StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(texts_of(&html, "[data-user-email]"), vec!["alice@example.com"]);
        assert_eq!(texts_of(&html, "[data-summary=balance] p"), vec!["$950.00"]);
        assert_eq!(texts_of(&html, "[data-transaction-card]").len(), 2);
        assert_eq!(texts_of(&html, "[data-share-of-income]"), vec!["5.0% of income"]);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");

        let live = Selector::parse("#dashboard-live").unwrap();
        let live = html.select(&live).next().unwrap();
        assert_eq!(live.value().attr("sse-connect"), Some(endpoints::DASHBOARD_LIVE));
        assert_eq!(live.value().attr("sse-swap"), Some("dashboard"));
    }

    #[tokio::test]
    async fn anonymous_visitor_is_sent_to_log_in() {
        let (state, _) = test_app_state();

        let response =
            get_dashboard_page(State(DashboardState::from_ref(&state)), Session::anonymous())
                .await;

        assert_status(&response, StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::LOG_IN_VIEW);
    }

    #[test]
    fn lists_are_split_by_type_and_newest_first() {
        let transactions = vec![
            transaction(1, -10.0, "Breakfast", 8),
            transaction(2, 500.0, "Pay", 9),
            transaction(3, -20.0, "Dinner", 19),
            transaction(4, -15.0, "Lunch", 12),
        ];

        let html = Html::parse_fragment(&dashboard_content(&transactions).into_string());

        let sections = Selector::parse("section").unwrap();
        let lists: Vec<_> = html
            .select(&sections)
            .filter(|section| section.value().attr("id") != Some("summary"))
            .collect();
        assert_eq!(lists.len(), 2);

        let card = Selector::parse("[data-transaction-card]").unwrap();
        let ids = |index: usize| -> Vec<String> {
            lists[index]
                .select(&card)
                .filter_map(|element| element.value().attr("id").map(ToOwned::to_owned))
                .collect()
        };
        assert_eq!(ids(0), vec!["transaction-2"]);
        assert_eq!(
            ids(1),
            vec!["transaction-3", "transaction-4", "transaction-1"]
        );
    }

    #[tokio::test]
    async fn live_region_is_pushed_on_connect() {
        let (state, alice) = test_app_state();
        state.transaction_store.create(&alice, income(1000.0)).unwrap();

        let response = stream_dashboard(State(state.transaction_store.clone()), alice).await;

        assert_status(&response, StatusCode::OK);
        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        let first = String::from_utf8_lossy(&first);
        assert!(first.contains("event: dashboard"), "got {first:?}");
        assert!(first.contains("data-summary"), "got {first:?}");
    }

    #[tokio::test]
    async fn stream_ends_when_user_logs_out() {
        let (state, alice) = test_app_state();

        let response = stream_dashboard(State(state.transaction_store.clone()), alice).await;
        let mut body = response.into_body().into_data_stream();
        body.next().await.unwrap().unwrap();

        state.transaction_store.close_user(alice.user_id().unwrap());
        state.transaction_store.create(&alice, income(5.0)).unwrap();

        let rest = tokio::time::timeout(std::time::Duration::from_secs(1), body.next())
            .await
            .expect("stream should end");
        assert!(rest.is_none(), "got {rest:?}");
    }

    #[tokio::test]
    async fn anonymous_stream_is_unauthorized() {
        let (state, _) = test_app_state();

        let response =
            stream_dashboard(State(state.transaction_store.clone()), Session::anonymous()).await;

        assert_status(&response, StatusCode::UNAUTHORIZED);
    }
}
