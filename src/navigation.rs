//! The navigation bar shown at the top of pages for logged in users.

use maud::{Markup, html};

use crate::endpoints;

/// A link in the navigation bar, highlighted when `is_current` is set.
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!( a href=(self.url) class=(style) aria-current=[self.is_current.then_some("page")] { (self.title) } )
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
    user_email: &'a str,
}

impl<'a> NavBar<'a> {
    /// The navigation bar for the user with `user_email`.
    ///
    /// The link matching `active_endpoint` is marked as the current page.
    pub fn new(active_endpoint: &str, user_email: &'a str) -> Self {
        let links = vec![
            Link {
                url: endpoints::DASHBOARD_VIEW,
                title: "Dashboard",
                is_current: active_endpoint == endpoints::DASHBOARD_VIEW,
            },
            Link {
                url: endpoints::LOG_OUT,
                title: "Log out",
                is_current: false,
            },
        ];

        NavBar { links, user_email }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href="/"
                        class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                    {
                        "Budget Tracker"
                    }

                    div class="flex items-center gap-6"
                    {
                        span
                            data-user-email
                            class="text-sm text-gray-600 dark:text-gray-400"
                        {
                            (self.user_email)
                        }

                        ul class="font-medium flex flex-row space-x-8"
                        {
                            @for link in self.links {
                                li { (link.into_html()) }
                            }
                        }
                    }
                }
            }
        )
    }
}
