//! Built-in candidate tables, in priority order.
//!
//! Order is behavior: the cascade returns the first visible hit, so specific
//! attribute and placeholder matches sit above generic type-based ones.

use super::Locator;

fn css(list: &[&str]) -> Vec<Locator> {
    list.iter().map(|s| Locator::css(*s)).collect()
}

/// Username / account / email inputs.
pub fn username() -> Vec<Locator> {
    css(&[
        "input[name='username']",
        "input[name='user']",
        "input[name='email']",
        "input[name='account']",
        "input[name='phone']",
        "input[name='mobile']",
        "input[name='login']",
        "input[id='username']",
        "input[id='user']",
        "input[id='email']",
        "input[id='account']",
        "input[id='phone']",
        "input[id='mobile']",
        "input[id='login']",
        "input[type='text']",
        "input[type='email']",
        "input[placeholder*='用户名']",
        "input[placeholder*='邮箱']",
        "input[placeholder*='账号']",
        "input[placeholder*='手机']",
        "input[placeholder*='username']",
        "input[placeholder*='email']",
        "input[placeholder*='account']",
        "input[placeholder*='phone']",
    ])
}

pub fn password() -> Vec<Locator> {
    css(&[
        "input[name='password']",
        "input[name='pwd']",
        "input[name='pass']",
        "input[id='password']",
        "input[id='pwd']",
        "input[id='pass']",
        "input[type='password']",
        "input[placeholder*='密码']",
        "input[placeholder*='password']",
        "input[placeholder*='pwd']",
    ])
}

pub fn captcha() -> Vec<Locator> {
    css(&[
        "input[name='captcha']",
        "input[name='verifyCode']",
        "input[name='validCode']",
        "input[id='captcha']",
        "input[id='verifyCode']",
        "input[id='validCode']",
        "input[placeholder*='验证码']",
        "input[placeholder*='captcha']",
        "input[placeholder*='verify']",
    ])
}

/// Submit controls: typed submits, then labelled buttons/links, then
/// conventional class and id names.
pub fn submit() -> Vec<Locator> {
    let mut out = css(&["button[type='submit']", "input[type='submit']"]);
    out.extend([
        Locator::text("button", "登录"),
        Locator::text("button", "登 录"),
        Locator::text("button", "Login"),
        Locator::text("button", "Sign in"),
        Locator::text("a", "登录"),
        Locator::text("a", "Login"),
        Locator::text("a", "Sign in"),
    ]);
    out.extend(css(&[
        ".login-button",
        ".loginBtn",
        ".submit-btn",
        ".signin-button",
        "#login-button",
        "#loginBtn",
        "#submit-btn",
        "#signin-button",
    ]));
    out
}

/// Containers that most likely wrap the login form.
pub fn login_form_container() -> Vec<Locator> {
    vec![
        Locator::xpath("//form[.//input[@type='password']]"),
        Locator::xpath(
            "//form[contains(@action, 'login') or contains(@action, 'auth') or contains(@action, 'sign-in')]",
        ),
        Locator::xpath("//form[@id='login-form' or @id='loginForm' or contains(@class, 'login')]"),
        Locator::xpath("//div[contains(@class, 'login-form') or contains(@class, 'login-container')]"),
    ]
}

/// Visible login controls; any hit after a cookie login means it failed.
pub fn login_buttons() -> Vec<Locator> {
    vec![
        Locator::text("button", "登录"),
        Locator::text("a", "登录"),
        Locator::text("button", "Login"),
        Locator::text("a", "Login"),
        Locator::text("button", "Sign in"),
        Locator::text("a", "Sign in"),
    ]
}
