use notes::Address;
use serde::{Deserialize, Serialize};
use zk_primitives::Element;

use crate::{Config, ErrorKind};

/// A shielded payment to another address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Who receives the note
    pub address: Address,
    /// The note's amount
    pub amount: u128,
}

/// What a transaction should do
///
/// A single request can combine a deposit, shielded payments, and a withdrawal. Whatever the
/// selected inputs and the deposit don't pay out comes back as a change note.
///
/// ```rust
/// # use tx_builder::*;
/// # use notes::Keypair;
/// let bob = Keypair::from_seed(&[2; 32]).address();
///
/// let request = TxRequest::withdraw(5 * ONE_UNIT, b"0xrecipient".to_vec())
///     .with_relayer(b"0xrelayer".to_vec(), ONE_UNIT / 100)
///     .pay(bob, ONE_UNIT);
///
/// assert_eq!(request.recipients.len(), 1);
/// assert_eq!(request.fee, ONE_UNIT / 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    /// Shielded payments, in the order their outputs are created
    pub recipients: Vec<Payment>,
    /// Amount moved into the pool
    pub deposit: u128,
    /// Amount moved out of the pool to `recipient`
    pub withdraw: u128,
    /// The external account receiving the withdrawal
    pub recipient: Vec<u8>,
    /// Paid to `relayer` out of the pool
    pub fee: u128,
    /// The relayer submitting the transaction
    pub relayer: Vec<u8>,
    /// Whether the withdrawal is relayed to a second domain through the bridge
    pub is_l1_withdrawal: bool,
    /// The fee for relaying to the second domain
    pub l1_fee: u128,
}

impl TxRequest {
    /// Move `amount` into the pool as a note owned by the sender
    #[must_use]
    pub fn deposit(amount: u128) -> Self {
        Self {
            deposit: amount,
            ..Self::default()
        }
    }

    /// Send `amount` to `address` inside the pool
    #[must_use]
    pub fn transfer(address: Address, amount: u128) -> Self {
        Self::default().pay(address, amount)
    }

    /// Move `amount` out of the pool to `recipient`
    #[must_use]
    pub fn withdraw(amount: u128, recipient: Vec<u8>) -> Self {
        Self {
            withdraw: amount,
            recipient,
            ..Self::default()
        }
    }

    /// Add a shielded payment
    #[must_use]
    pub fn pay(mut self, address: Address, amount: u128) -> Self {
        self.recipients.push(Payment { address, amount });
        self
    }

    /// Have `relayer` submit the transaction for `fee`
    #[must_use]
    pub fn with_relayer(mut self, relayer: Vec<u8>, fee: u128) -> Self {
        self.relayer = relayer;
        self.fee = fee;
        self
    }

    /// Relay the withdrawal to a second domain
    #[must_use]
    pub fn to_l1(mut self, l1_fee: u128) -> Self {
        self.is_l1_withdrawal = true;
        self.l1_fee = l1_fee;
        self
    }

    /// Check the request against the configured bounds and output count, and derive its amounts
    pub(crate) fn amounts(&self, config: &Config) -> Result<Amounts, ErrorKind> {
        let out_of_range = |what: &'static str, amount: u128, bound: String| {
            ErrorKind::AmountOutOfRange {
                what,
                amount,
                bound,
            }
        };

        if self.deposit > config.max_deposit {
            return Err(out_of_range(
                "deposit",
                self.deposit,
                format!("maximum is {}", config.max_deposit),
            ));
        }

        if self.withdraw > 0 && self.withdraw < config.min_withdraw {
            return Err(out_of_range(
                "withdrawal",
                self.withdraw,
                format!("minimum is {}", config.min_withdraw),
            ));
        }

        if self.recipients.len() > config.output_count {
            return Err(ErrorKind::TooManyOutputs {
                requested: self.recipients.len(),
                available: config.output_count,
            });
        }

        let signed = |what: &'static str, amount: u128| {
            i128::try_from(amount)
                .map_err(|_| out_of_range(what, amount, format!("maximum is {}", i128::MAX)))
        };

        let deposit = signed("deposit", self.deposit)?;
        let withdraw = signed("withdrawal", self.withdraw)?;
        let fee = signed("fee", self.fee)?;

        let ext_amount = deposit - withdraw;
        let public_amount = ext_amount
            .checked_sub(fee)
            .ok_or_else(|| out_of_range("fee", self.fee, "fee and withdrawal overflow".into()))?;

        let payments = self
            .recipients
            .iter()
            .try_fold(0u128, |total, payment| total.checked_add(payment.amount))
            .ok_or_else(|| out_of_range("payments", u128::MAX, "total overflows".into()))?;

        let outgoing = payments
            .checked_add(self.withdraw)
            .and_then(|total| total.checked_add(self.fee))
            .ok_or_else(|| out_of_range("payments", payments, "total overflows".into()))?;

        Ok(Amounts {
            ext_amount,
            public_amount: Element::from_i128(public_amount),
            deposit: self.deposit,
            outgoing,
            required: outgoing.saturating_sub(self.deposit),
        })
    }
}

/// The amounts derived from a valid [`TxRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Amounts {
    /// `deposit - withdraw`
    pub ext_amount: i128,
    /// `ext_amount - fee` in the field
    pub public_amount: Element,
    pub deposit: u128,
    /// Payments, withdrawal, and fee together
    pub outgoing: u128,
    /// What the inputs have to cover
    pub required: u128,
}

impl Amounts {
    /// What is left for the sender once `inputs` and the deposit have paid everything out
    pub fn change(&self, inputs: u128) -> Option<u128> {
        inputs.checked_add(self.deposit)?.checked_sub(self.outgoing)
    }
}

#[cfg(test)]
mod tests {
    use notes::Keypair;

    use super::*;
    use crate::ONE_UNIT;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn deposit_needs_no_inputs() {
        let amounts = TxRequest::deposit(ONE_UNIT).amounts(&config()).unwrap();

        assert_eq!(amounts.ext_amount, ONE_UNIT as i128);
        assert_eq!(amounts.public_amount, Element::from(ONE_UNIT));
        assert_eq!(amounts.required, 0);
        assert_eq!(amounts.change(0), Some(ONE_UNIT));
    }

    #[test]
    fn withdrawal_with_fee_is_negative() {
        let request =
            TxRequest::withdraw(ONE_UNIT / 2, vec![1]).with_relayer(vec![2], ONE_UNIT / 100);
        let amounts = request.amounts(&config()).unwrap();

        assert_eq!(amounts.ext_amount, -((ONE_UNIT / 2) as i128));
        assert_eq!(
            amounts.public_amount,
            Element::from_i128(-((ONE_UNIT / 2 + ONE_UNIT / 100) as i128))
        );
        assert_eq!(amounts.required, ONE_UNIT / 2 + ONE_UNIT / 100);
        assert_eq!(amounts.change(ONE_UNIT), Some(ONE_UNIT / 2 - ONE_UNIT / 100));
    }

    #[test]
    fn deposit_offsets_what_inputs_must_cover() {
        let bob = Keypair::from_seed(&[2; 32]).address();
        let request = TxRequest {
            deposit: 3,
            ..TxRequest::transfer(bob, 10)
        };
        let config = Config {
            max_deposit: 100,
            ..config()
        };

        let amounts = request.amounts(&config).unwrap();
        assert_eq!(amounts.required, 7);
        assert_eq!(amounts.change(7), Some(0));
        assert_eq!(amounts.change(6), None);
    }

    #[test]
    fn bounds() {
        let config = config();

        let error = TxRequest::deposit(config.max_deposit + 1)
            .amounts(&config)
            .unwrap_err();
        assert!(matches!(
            error,
            ErrorKind::AmountOutOfRange {
                what: "deposit",
                ..
            }
        ));

        let error = TxRequest::withdraw(config.min_withdraw - 1, vec![])
            .amounts(&config)
            .unwrap_err();
        assert!(matches!(
            error,
            ErrorKind::AmountOutOfRange {
                what: "withdrawal",
                ..
            }
        ));

        assert!(TxRequest::deposit(config.max_deposit).amounts(&config).is_ok());
        assert!(TxRequest::withdraw(config.min_withdraw, vec![])
            .amounts(&config)
            .is_ok());
        assert!(TxRequest::withdraw(0, vec![]).amounts(&config).is_ok());
    }

    #[test]
    fn more_payments_than_outputs() {
        let config = config();
        let request = (1u8..)
            .take(config.output_count + 1)
            .fold(TxRequest::default(), |request, seed| {
                request.pay(Keypair::from_seed(&[seed; 32]).address(), 1)
            });

        assert_eq!(
            request.amounts(&config).unwrap_err(),
            ErrorKind::TooManyOutputs {
                requested: config.output_count + 1,
                available: config.output_count
            }
        );
    }

    #[test]
    fn huge_fee_is_out_of_range() {
        let request = TxRequest::default().with_relayer(vec![], u128::MAX);
        let error = request.amounts(&config()).unwrap_err();

        assert!(matches!(error, ErrorKind::AmountOutOfRange { what: "fee", .. }));
    }
}
