/// One entry of the client route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: &'static str,
    pub path: &'static str,
    pub requires_auth: bool,
}

pub const LOGIN: &str = "login";
pub const LOGOUT: &str = "logout";
pub const FOUND_FIRST_COMPANY: &str = "foundFirstCompany";

pub const LOGIN_PATH: &str = "/login";
pub const FOUND_FIRST_COMPANY_PATH: &str = "/found/first/company";

const fn public(name: &'static str, path: &'static str) -> Route {
    Route { name, path, requires_auth: false }
}

const fn protected(name: &'static str, path: &'static str) -> Route {
    Route { name, path, requires_auth: true }
}

/// The game's route table. Paths with `:`-prefixed segments take parameters;
/// the guard only ever looks at `name` and `requires_auth`.
pub static ROUTES: &[Route] = &[
    public("home", "/"),
    // auth routes
    protected(LOGOUT, "/logout"),
    protected(FOUND_FIRST_COMPANY, FOUND_FIRST_COMPANY_PATH),
    protected("notifications", "/notifications"),
    protected("notificationDetail", "/notification/:id/"),
    protected("messages", "/messages"),
    protected("messageDetail", "/message/:id/"),
    // public routes
    public(LOGIN, LOGIN_PATH),
    public("register", "/register"),
    public("company", "/company/:isin/"),
    public("statementOfAccount", "/company/:isin/statement_of_account"),
    public("tradesCompany", "/company/:isin/trades/"),
    public("depot", "/company/:isin/depot/"),
    public("orderbook", "/company/:isin/orderbook/"),
    public("shareholders", "/company/:isin/shareholders/"),
    public("articlesCompany", "/company/:isin/articles/"),
    public("buyerSeller", "/company/:isin/buyerSeller/"),
    protected("order", "/company/:isin/order/"),
    public("companies", "/companies/"),
    public("trades", "/trades/"),
    public("ownOrders", "/orders/own"),
    public("bonds", "/bonds/"),
    public("liveOrders", "/live-orders/"),
    public("newspaper", "/newspaper/"),
    public("forum", "/forum/"),
    public("thread", "/forum/thread/:slug/:threadId"),
    public("chat", "/chat"),
    public("profile", "/profile/:id"),
    public("fonds", "/fonds"),
    public("fondDetail", "/fonds/:id"),
    protected("threadFond", "/fonds/:id/forum/thread/:slug/:threadId"),
    protected("applicationFond", "/fonds/:id/application"),
    public("dataProtection", "/data-protection"),
    public("imprint", "/imprint"),
    // catch-all target; unnamed, so the guard skips the progress bracket
    public("", "/404"),
];

pub fn by_name(name: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| !r.name.is_empty() && r.name == name)
}
