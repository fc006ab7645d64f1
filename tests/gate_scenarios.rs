mod common;

use cashier_gate::application::consent::ConsentForm;
use cashier_gate::application::gate::{GateOutcome, Stage};
use cashier_gate::application::verification::VerificationState;
use cashier_gate::domain::blocking::{BlockingReason, Notice};
use cashier_gate::domain::cashier::{
    ApiError, CashierResponse, CashierType, FrameHeightMessage, TradingAccount, VerificationToken,
    WithdrawalLimits,
};
use cashier_gate::domain::status::{AccountStatusResponse, CurrencyRestrictions};
use cashier_gate::error::CashierError;
use cashier_gate::infrastructure::in_memory::{ApiCall, RecordingView, ScriptedCashierApi, ViewEvent};
use common::{DEPOSIT_URL, WITHDRAW_URL, client, gate, status, status_reply};
use rust_decimal_macros::dec;
use std::time::Duration;

fn is_cashier(call: &ApiCall) -> bool {
    matches!(call, ApiCall::Cashier { .. })
}

fn is_email(call: &ApiCall) -> bool {
    matches!(call, ApiCall::VerifyEmail { .. })
}

fn url(url: &str) -> CashierResponse {
    CashierResponse::Url(url.to_string())
}

fn failure(code: &str, message: &str) -> CashierResponse {
    CashierResponse::Failure(ApiError::new(code, message))
}

#[tokio::test]
async fn test_crypto_maintenance_blocks_withdrawal() {
    let api = ScriptedCashierApi::new();
    api.set_account_status(Ok(status_reply(status(
        &["cashier_locked"],
        &["system_maintenance"],
    ))))
    .await;
    let view = RecordingView::new();
    let gate = gate(client("BTC", dec!(0.5)), WITHDRAW_URL, &api, &view);

    let outcome = gate.run().await;

    assert_eq!(
        outcome,
        GateOutcome::Blocked {
            reason: BlockingReason::MaintenanceWithdrawal { cashier_locked: true }
        }
    );
    assert_eq!(gate.stage(), Stage::Terminal);
    assert_eq!(api.count(is_cashier).await, 0);
    let notice = view.last_notice().unwrap();
    assert!(notice.text.unwrap().contains("cryptocurrency cashier"));
}

#[tokio::test]
async fn test_suspended_currency_blocks_deposit() {
    let api = ScriptedCashierApi::new();
    let mut account = status(&[], &[]);
    account.currency_config.insert(
        "BTC".to_string(),
        CurrencyRestrictions {
            deposit_suspended: true,
            withdrawal_suspended: false,
        },
    );
    api.set_account_status(Ok(status_reply(account))).await;
    let view = RecordingView::new();
    let gate = gate(client("BTC", dec!(1)), DEPOSIT_URL, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Blocked {
            reason: BlockingReason::CurrencyRestricted
        }
    );
}

#[tokio::test]
async fn test_empty_balance_blocks_withdrawal_before_any_request() {
    let api = ScriptedCashierApi::new();
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(0)), WITHDRAW_URL, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Blocked {
            reason: BlockingReason::NoBalance
        }
    );
    assert!(api.calls().await.is_empty());
    assert_eq!(view.last_notice(), Some(Notice::error("no_balance_error")));
}

#[tokio::test]
async fn test_funds_protection_consent_then_retry() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(failure("ASK_UK_FUNDS_PROTECTION", "Please accept.")))
        .await;
    api.push_cashier(Ok(url("https://pay.example/session"))).await;
    let view = RecordingView::new();
    let gate = gate(client("GBP", dec!(50)), DEPOSIT_URL, &api, &view);

    assert_eq!(gate.run().await, GateOutcome::ConsentPending);
    assert!(view.events().contains(&ViewEvent::ConsentForm));
    assert_eq!(api.count(is_cashier).await, 1);

    let outcome = gate.submit_consent(ConsentForm::accepted()).await.unwrap();
    assert!(matches!(outcome, GateOutcome::Embedded { .. }));
    assert_eq!(api.count(is_cashier).await, 2);
    assert_eq!(api.count(|c| matches!(c, ApiCall::Consent { .. })).await, 1);
}

#[tokio::test]
async fn test_incomplete_consent_is_not_submitted() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(failure("ASK_UK_FUNDS_PROTECTION", ""))).await;
    let view = RecordingView::new();
    let gate = gate(client("GBP", dec!(50)), DEPOSIT_URL, &api, &view);
    gate.run().await;

    let result = gate
        .submit_consent(ConsentForm::new().accept_terms())
        .await;
    assert!(result.is_err());
    assert_eq!(api.count(|c| matches!(c, ApiCall::Consent { .. })).await, 0);
}

#[tokio::test]
async fn test_rejected_consent_shows_server_message() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(failure("ASK_UK_FUNDS_PROTECTION", ""))).await;
    api.set_consent(Ok(cashier_gate::domain::cashier::ApiReply::failed(ApiError::new(
        "InvalidRequest",
        "Consent could not be saved.",
    ))))
    .await;
    let view = RecordingView::new();
    let gate = gate(client("GBP", dec!(50)), DEPOSIT_URL, &api, &view);
    gate.run().await;

    let outcome = gate.submit_consent(ConsentForm::accepted()).await.unwrap();
    assert_eq!(
        outcome,
        GateOutcome::Notice {
            notice: Notice::custom_error("Consent could not be saved.")
        }
    );
    assert_eq!(api.count(is_cashier).await, 1);
}

fn is_consent(call: &ApiCall) -> bool {
    matches!(call, ApiCall::Consent { .. })
}

#[tokio::test]
async fn test_consent_without_form_is_refused() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(url("https://pay.example/a"))).await;
    api.push_cashier(Ok(url("https://pay.example/b"))).await;
    let view = RecordingView::new();
    let gate = gate(client("GBP", dec!(50)), DEPOSIT_URL, &api, &view);

    assert!(matches!(gate.run().await, GateOutcome::Embedded { .. }));

    let result = gate.submit_consent(ConsentForm::accepted()).await;
    assert!(matches!(result, Err(CashierError::ConsentNotRequested)));
    assert_eq!(api.count(is_consent).await, 0);
    assert_eq!(api.count(is_cashier).await, 1);
    assert_eq!(gate.frame().unwrap().url, "https://pay.example/a");
}

#[tokio::test]
async fn test_consent_is_submitted_once_per_form() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(failure("ASK_UK_FUNDS_PROTECTION", ""))).await;
    api.push_cashier(Ok(url("https://pay.example/b"))).await;
    api.push_cashier(Ok(url("https://pay.example/c"))).await;
    let view = RecordingView::new();
    let gate = gate(client("GBP", dec!(50)), DEPOSIT_URL, &api, &view);
    gate.run().await;

    let first = gate.submit_consent(ConsentForm::accepted()).await.unwrap();
    assert!(matches!(first, GateOutcome::Embedded { .. }));

    let second = gate.submit_consent(ConsentForm::accepted()).await;
    assert!(matches!(second, Err(CashierError::ConsentNotRequested)));
    assert_eq!(api.count(is_consent).await, 1);
    assert_eq!(api.count(is_cashier).await, 2);
    assert_eq!(gate.frame().unwrap().url, "https://pay.example/b");
}

#[tokio::test]
async fn test_incomplete_form_keeps_consent_open() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(failure("ASK_UK_FUNDS_PROTECTION", ""))).await;
    api.push_cashier(Ok(url("https://pay.example/b"))).await;
    let view = RecordingView::new();
    let gate = gate(client("GBP", dec!(50)), DEPOSIT_URL, &api, &view);
    gate.run().await;

    assert!(matches!(
        gate.submit_consent(ConsentForm::new()).await,
        Err(CashierError::ConsentIncomplete)
    ));
    let outcome = gate.submit_consent(ConsentForm::accepted()).await.unwrap();
    assert!(matches!(outcome, GateOutcome::Embedded { .. }));
    assert_eq!(api.count(is_consent).await, 1);
}

#[tokio::test]
async fn test_rejected_consent_hides_form_before_notice() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(failure("ASK_UK_FUNDS_PROTECTION", ""))).await;
    api.set_consent(Err("connection lost".to_string())).await;
    let view = RecordingView::new();
    let gate = gate(client("GBP", dec!(50)), DEPOSIT_URL, &api, &view);
    gate.run().await;

    gate.submit_consent(ConsentForm::accepted()).await.unwrap();

    let events = view.events();
    let hidden = events
        .iter()
        .position(|event| *event == ViewEvent::ConsentFormHidden)
        .unwrap();
    let notice = events
        .iter()
        .rposition(|event| matches!(event, ViewEvent::Notice { .. }))
        .unwrap();
    assert!(hidden < notice);
    assert_eq!(
        view.last_notice(),
        Some(Notice::custom_error("Transport error: connection lost"))
    );
}

#[tokio::test]
async fn test_consent_required_by_account_status() {
    let api = ScriptedCashierApi::new();
    api.set_account_status(Ok(status_reply(status(
        &["cashier_locked"],
        &["ASK_UK_FUNDS_PROTECTION"],
    ))))
    .await;
    api.push_cashier(Ok(url("https://pay.example/uk"))).await;
    let view = RecordingView::new();
    let gate = gate(client("GBP", dec!(5)), DEPOSIT_URL, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Blocked {
            reason: BlockingReason::ConsentRequired
        }
    );
    assert!(view.events().contains(&ViewEvent::ConsentForm));
    assert_eq!(view.last_notice(), None);

    let outcome = gate.submit_consent(ConsentForm::accepted()).await.unwrap();
    assert!(matches!(outcome, GateOutcome::Embedded { .. }));
}

#[tokio::test]
async fn test_missing_currency_redirects_with_hint() {
    let api = ScriptedCashierApi::new();
    let view = RecordingView::new();
    let client = cashier_gate::domain::client::ClientProfile::new("client@example.com");
    let gate = gate(client, WITHDRAW_URL, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Blocked {
            reason: BlockingReason::NoCurrencySelected
        }
    );
    assert_eq!(
        view.events(),
        vec![ViewEvent::Redirect {
            target: "user/set-currency#redirect_withdraw".to_string()
        }]
    );
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn test_status_error_is_inconclusive() {
    let api = ScriptedCashierApi::new();
    api.set_account_status(Ok(AccountStatusResponse {
        get_account_status: Some(status(&["cashier_locked"], &[])),
        error: Some(ApiError::new("InternalServerError", "oops")),
    }))
    .await;
    api.push_cashier(Ok(url("https://pay.example/ok"))).await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);

    assert!(matches!(gate.run().await, GateOutcome::Embedded { .. }));
}

#[tokio::test]
async fn test_status_transport_failure_is_inconclusive() {
    let api = ScriptedCashierApi::new();
    api.set_account_status(Err("socket closed".to_string())).await;
    api.push_cashier(Ok(url("https://pay.example/ok"))).await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);

    assert!(matches!(gate.run().await, GateOutcome::Embedded { .. }));
}

#[tokio::test]
async fn test_stages_run_in_order() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(url("https://pay.example/ok"))).await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);
    assert_eq!(gate.stage(), Stage::Init);

    gate.run().await;

    assert_eq!(
        api.calls().await,
        vec![
            ApiCall::AccountStatus,
            ApiCall::WebsiteStatus,
            ApiCall::Settings,
            ApiCall::Cashier {
                request: cashier_gate::domain::cashier::CashierRequest {
                    cashier_type: CashierType::Deposit,
                    verification_code: None,
                    provider: None,
                }
            },
        ]
    );
}

#[tokio::test]
async fn test_empty_deposit_account_primes_lookups_and_tolerates_failure() {
    let api = ScriptedCashierApi::new();
    api.set_statement(Err("timeout".to_string())).await;
    api.set_trading_accounts(Ok(vec![
        TradingAccount {
            login: "MTR1001".to_string(),
        },
        TradingAccount {
            login: "MTR1002".to_string(),
        },
    ]))
    .await;
    api.push_cashier(Ok(url("https://pay.example/ok"))).await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(0)), DEPOSIT_URL, &api, &view);

    assert!(matches!(gate.run().await, GateOutcome::Embedded { .. }));
    let data = gate.supplementary();
    assert_eq!(data.recent_transaction, None);
    assert_eq!(data.trading_accounts, Some(2));
    assert_eq!(api.count(|c| matches!(c, ApiCall::Statement { limit: 1 })).await, 1);
}

#[tokio::test]
async fn test_funded_deposit_skips_lookups() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(url("https://pay.example/ok"))).await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);
    gate.run().await;

    assert_eq!(
        api.count(|c| matches!(c, ApiCall::Statement { .. } | ApiCall::Mt5LoginList))
            .await,
        0
    );
}

#[tokio::test]
async fn test_withdrawal_limit_reached_refreshes_status() {
    let api = ScriptedCashierApi::new();
    api.set_limits(Ok(WithdrawalLimits {
        remainder: Some(dec!(0.5)),
    }))
    .await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(100)), WITHDRAW_URL, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Blocked {
            reason: BlockingReason::WithdrawalLimitReached
        }
    );
    assert_eq!(api.count(is_cashier).await, 0);

    for _ in 0..10 {
        if view.events().contains(&ViewEvent::StatusRefreshed) {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(view.events().contains(&ViewEvent::StatusRefreshed));
    assert_eq!(api.count(|c| matches!(c, ApiCall::AccountStatus)).await, 2);
}

#[tokio::test]
async fn test_withdrawal_with_url_token_reaches_cashier() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(url("https://pay.example/w"))).await;
    let view = RecordingView::new();
    let page = format!("{WITHDRAW_URL}#token=Ab3dE6g8");
    let gate = gate(client("USD", dec!(10)), &page, &api, &view);

    assert_eq!(gate.cashier_type(), CashierType::Withdraw);
    assert!(matches!(gate.run().await, GateOutcome::Embedded { .. }));
    assert!(matches!(
        gate.verification_state(),
        VerificationState::TokenReady(_)
    ));
    assert_eq!(api.count(is_email).await, 0);
    let calls = api.calls().await;
    let sent = calls
        .iter()
        .find_map(|call| match call {
            ApiCall::Cashier { request } => Some(request.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(sent.verification_code, Some(VerificationToken::new("Ab3dE6g8")));
}

#[tokio::test]
async fn test_withdrawal_without_token_asks_to_check_email() {
    let api = ScriptedCashierApi::new();
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), WITHDRAW_URL, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Notice {
            notice: Notice::message("check_email_message")
        }
    );
    assert_eq!(api.count(is_email).await, 1);
    assert_eq!(api.count(is_cashier).await, 0);
}

#[tokio::test]
async fn test_malformed_url_token() {
    let api = ScriptedCashierApi::new();
    let view = RecordingView::new();
    let page = format!("{WITHDRAW_URL}#token=abc");
    let gate = gate(client("USD", dec!(10)), &page, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Notice {
            notice: Notice::error("token_error")
        }
    );
    assert_eq!(api.count(is_email).await, 0);
}

#[tokio::test]
async fn test_stale_token_requests_new_email() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(failure("ASK_EMAIL_VERIFY", "Verify your email.")))
        .await;
    let view = RecordingView::new();
    let page = format!("{WITHDRAW_URL}#token=Ab3dE6g8");
    let gate = gate(client("USD", dec!(10)), &page, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Notice {
            notice: Notice::message("check_email_message")
        }
    );
    assert_eq!(api.count(is_cashier).await, 1);
    assert_eq!(api.count(is_email).await, 1);
}

#[tokio::test]
async fn test_host_app_uses_typed_code() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(url("https://pay.example/app"))).await;
    let view = RecordingView::new().with_verification_code("Qw3rTy12");
    let mut profile = client("USD", dec!(10));
    profile.host_app = true;
    let page = format!("{WITHDRAW_URL}#token=Ab3dE6g8");
    let gate = gate(profile, &page, &api, &view);

    assert!(matches!(gate.run().await, GateOutcome::Embedded { .. }));
    assert_eq!(api.count(is_email).await, 1);
    let calls = api.calls().await;
    assert!(calls.iter().any(|call| matches!(
        call,
        ApiCall::Cashier { request } if request.verification_code == Some(VerificationToken::new("Qw3rTy12"))
    )));
}

#[tokio::test]
async fn test_provider_marker_in_path() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(url("https://epg.example/s"))).await;
    let view = RecordingView::new();
    let page = "https://www.binary.com/en/cashier/epg_forwardws.html?action=deposit";
    let gate = gate(client("USD", dec!(10)), page, &api, &view);
    gate.run().await;

    let calls = api.calls().await;
    assert!(calls.iter().any(|call| matches!(
        call,
        ApiCall::Cashier { request } if request.provider.as_deref() == Some("epg")
    )));
}

#[tokio::test]
async fn test_cashier_transport_failure_is_surfaced() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Err("connection lost".to_string())).await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);

    assert_eq!(
        gate.run().await,
        GateOutcome::Notice {
            notice: Notice::custom_error("Transport error: connection lost")
        }
    );
}

#[tokio::test]
async fn test_unknown_cashier_error_shows_message_verbatim() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(failure("CashierForwardError", "Please try again later.")))
        .await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);

    gate.run().await;
    assert_eq!(
        view.last_notice(),
        Some(Notice::custom_error("Please try again later."))
    );
}

#[tokio::test]
async fn test_height_messages_follow_origin_rule() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(url("https://pay.example/fiat"))).await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);
    gate.run().await;

    assert_eq!(
        gate.on_frame_message(&FrameHeightMessage::new("https://www.binary.com", "500")),
        None
    );
    assert_eq!(view.frame_height(), None);

    assert_eq!(
        gate.on_frame_message(&FrameHeightMessage::new("https://pay.example", "842")),
        Some(842)
    );
    assert_eq!(view.frame_height(), Some(842));

    gate.on_frame_message(&FrameHeightMessage::new("https://pay.example", "resize"));
    assert_eq!(view.frame_height(), Some(700));
}

#[tokio::test]
async fn test_teardown_stops_height_updates() {
    let api = ScriptedCashierApi::new();
    api.push_cashier(Ok(url("https://pay.example/fiat"))).await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);
    gate.run().await;

    gate.teardown();
    assert!(gate.is_disposed());
    assert_eq!(
        gate.on_frame_message(&FrameHeightMessage::new("https://pay.example", "842")),
        None
    );
    assert!(!gate.frame().unwrap().listening);
}

#[tokio::test(start_paused = true)]
async fn test_late_status_after_teardown_is_ignored() {
    let api = ScriptedCashierApi::new().with_latency(Duration::from_millis(100));
    api.set_account_status(Ok(status_reply(status(&["cashier_locked"], &[]))))
        .await;
    let view = RecordingView::new();
    let gate = gate(client("USD", dec!(10)), DEPOSIT_URL, &api, &view);

    let (outcome, _) = tokio::join!(gate.run(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.teardown();
    });

    assert_eq!(outcome, GateOutcome::Abandoned);
    assert!(view.events().is_empty());
}
