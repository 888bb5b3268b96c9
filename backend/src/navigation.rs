//! Page routes and the access rules that guard them

use crate::models::{User, UserRole};

/// Every page of the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    SignUp,
    SignIn,
    Home,
    Profile,
    Lender,
    Borrower,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::SignUp => "/signup",
            Route::SignIn => "/signin",
            Route::Home => "/home",
            Route::Profile => "/profile",
            Route::Lender => "/lender",
            Route::Borrower => "/borrower",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Landing | Route::SignUp | Route::SignIn)
    }

    /// Role a signed-in user must hold to see this page
    pub fn required_role(&self) -> Option<UserRole> {
        match self {
            Route::Lender => Some(UserRole::Lender),
            Route::Borrower => Some(UserRole::Borrower),
            _ => None,
        }
    }
}

/// Outcome of checking a page visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Route),
}

/// Decide whether `user` (None when signed out) may open `route`
pub fn check_access(route: Route, user: Option<&User>) -> Access {
    if route.is_public() {
        return Access::Allow;
    }

    let Some(user) = user else {
        return Access::Redirect(Route::SignIn);
    };

    match route.required_role() {
        Some(role) if user.role != role => Access::Redirect(Route::Home),
        _ => Access::Allow,
    }
}

/// Dashboard a user lands on from Home, if their role is chosen
pub fn home_destination(user: &User) -> Option<Route> {
    match user.role {
        UserRole::Lender => Some(Route::Lender),
        UserRole::Borrower => Some(Route::Borrower),
        UserRole::Unset => None,
    }
}
