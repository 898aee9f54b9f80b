#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, Bytes, U256};
    use rand::Rng;
    use shielded_vault_ledger::*;
    use shielded_vault_lib::*;

    const VAULT: Address = Address::repeat_byte(0xaa);
    const TOKEN: Address = Address::repeat_byte(0x70);
    const USER: Address = Address::repeat_byte(0x01);
    const RELAYER: Address = Address::repeat_byte(0xfe);

    type TestVault = Vault<MockBackend, MockToken>;

    fn setup() -> TestVault {
        let mut token = MockToken::new(VAULT);
        token.mint(USER, U256::from(1_000_000u64));
        token.approve(USER, U256::from(1_000_000u64));
        let mut vault = Vault::new(VAULT, Pipeline::new(MockBackend::default()));
        vault.register_token(TOKEN, token).unwrap();
        vault
    }

    fn note(rng: &mut impl Rng, amount: u64) -> Note {
        Note::new(amount, Fr::from_be_bytes_reduced(rng.gen()))
    }

    fn deposit_params(notes: &[Note], fee: u64) -> DepositParams {
        let total: u64 = notes
            .iter()
            .map(|n| n.amount.value().to::<u64>())
            .sum();
        DepositParams {
            token: TOKEN,
            total_deposit_amount: U256::from(total),
            deposit_commitment_params: notes
                .iter()
                .map(|n| DepositCommitmentParams {
                    poseidon_hash: n.commitment(),
                    owner: USER,
                    metadata: Bytes::from_static(b"note"),
                })
                .collect(),
            fee: U256::from(fee),
            fee_recipient: RELAYER,
        }
    }

    /// Deposit `amounts` padded with zero notes to the deposit slot count.
    fn deposit(vault: &mut TestVault, rng: &mut impl Rng, amounts: &[u64]) -> Vec<Note> {
        let notes: Vec<_> = (0..DEPOSIT_SLOTS)
            .map(|i| note(rng, amounts.get(i).copied().unwrap_or(0)))
            .collect();
        let (proof, _) = vault
            .pipeline()
            .prove(&Witness::deposit(&notes), CircuitVariant::Deposit)
            .unwrap();
        vault.deposit(USER, &deposit_params(&notes, 0), &proof).unwrap();
        notes
    }

    fn spend_params(inputs: &[Note], outputs: &[Note], fee: u64) -> SpendParams {
        SpendParams {
            token: TOKEN,
            inputs_hashes: inputs.iter().map(Note::commitment).collect(),
            outputs_hashes: outputs.iter().map(Note::commitment).collect(),
            fee: U256::from(fee),
            fee_recipient: RELAYER,
        }
    }

    #[test]
    fn test_deposit_three_random_amounts() {
        let mut rng = rand::thread_rng();
        let mut vault = setup();
        let amounts: Vec<u64> = (0..3).map(|_| rng.gen_range(0..10_000)).collect();
        let notes: Vec<_> = amounts.iter().map(|a| note(&mut rng, *a)).collect();

        let (proof, signals) = vault
            .pipeline()
            .prove(&Witness::deposit(&notes), CircuitVariant::Deposit)
            .unwrap();
        let total: u64 = amounts.iter().sum();
        assert_eq!(signals.total(CircuitVariant::Deposit), Some(Fr::from(total)));

        // the verifier entry point accepts it, twice
        let call = to_verifier_call_data(&proof, &signals);
        assert!(vault.verify(CircuitVariant::Deposit, &call));
        assert!(vault.verify(CircuitVariant::Deposit, &call));

        if total == 0 {
            return;
        }
        let receipt = vault
            .deposit(USER, &deposit_params(&notes, 3), &proof)
            .unwrap();
        assert_eq!(receipt.events.len(), 1 + notes.len());
        for n in &notes {
            assert!(vault.is_registered(TOKEN, n.commitment()));
        }
        let token = vault.token(TOKEN).unwrap();
        assert_eq!(token.balance_of(VAULT), U256::from(total));
        assert_eq!(token.balance_of(RELAYER), U256::from(3u64));
    }

    #[test]
    fn test_spend_1_in_1_out() {
        let mut rng = rand::thread_rng();
        let mut vault = setup();
        let deposited = deposit(&mut vault, &mut rng, &[1010]);
        let output = note(&mut rng, 1000);

        let (proof, _) = vault
            .pipeline()
            .prove(
                &Witness::spend(&deposited[..1], &[output], 10u64),
                CircuitVariant::Spend11,
            )
            .unwrap();
        let args = SpendArgs {
            inputs_hashes: [deposited[0].commitment()],
            outputs_hashes: [output.commitment()],
            fee: U256::from(10u64),
        };
        vault.spend_11(TOKEN, RELAYER, args, &proof).unwrap();
        let after_first = vault.registry().clone();

        let err = vault.spend_11(TOKEN, RELAYER, args, &proof).unwrap_err();
        assert_eq!(err.to_string(), "Vault: Commitment already used");
        assert_eq!(vault.registry(), &after_first);
        assert_eq!(
            vault.token(TOKEN).unwrap().balance_of(RELAYER),
            U256::from(10u64)
        );
    }

    #[test]
    fn test_spend_2_in_2_out() {
        let mut rng = rand::thread_rng();
        let mut vault = setup();
        let deposited = deposit(&mut vault, &mut rng, &[600, 400]);
        let outputs = [note(&mut rng, 690), note(&mut rng, 300)];
        let witness = Witness::spend(&deposited[..2], &outputs, 10u64);

        // one output amount off by one, same commitments and fee
        for slot in 0..2 {
            let mut tampered = witness.clone();
            if let Witness::Spend(w) = &mut tampered {
                w.output_amounts[slot] = w.output_amounts[slot] + Fr::from(1u64);
            }
            assert!(vault
                .pipeline()
                .prove(&tampered, CircuitVariant::Spend22)
                .is_err());
        }

        let (proof, _) = vault
            .pipeline()
            .prove(&witness, CircuitVariant::Spend22)
            .unwrap();
        vault
            .spend(
                CircuitVariant::Spend22,
                &spend_params(&deposited[..2], &outputs, 10),
                &proof,
            )
            .unwrap();
        assert!(vault.is_spent(TOKEN, deposited[0].commitment()));
        assert!(vault.is_spent(TOKEN, deposited[1].commitment()));
        assert!(vault.is_registered(TOKEN, outputs[0].commitment()));
        assert!(vault.is_registered(TOKEN, outputs[1].commitment()));
    }

    #[test]
    fn test_spend_16_in_1_out() {
        let mut rng = rand::thread_rng();
        let mut vault = setup();

        // sixteen notes need six deposits of three slots
        let mut amounts = vec![62u64; 15];
        amounts.push(70);
        let mut inputs = Vec::new();
        for chunk in amounts.chunks(DEPOSIT_SLOTS) {
            let notes = deposit(&mut vault, &mut rng, chunk);
            inputs.extend_from_slice(&notes[..chunk.len()]);
        }
        assert_eq!(inputs.len(), 16);

        let output = note(&mut rng, 990);
        let (proof, signals) = vault
            .pipeline()
            .prove(
                &Witness::spend(&inputs, &[output], 10u64),
                CircuitVariant::Spend161,
            )
            .unwrap();
        assert_eq!(signals.len(), 18);

        let args = SpendArgs {
            inputs_hashes: core::array::from_fn::<_, 16, _>(|i| inputs[i].commitment()),
            outputs_hashes: [output.commitment()],
            fee: U256::from(10u64),
        };
        vault.spend_161(TOKEN, RELAYER, args, &proof).unwrap();
        assert!(inputs.iter().all(|n| vault.is_spent(TOKEN, n.commitment())));
        assert_eq!(
            vault.token(TOKEN).unwrap().balance_of(VAULT),
            U256::from(990u64)
        );
    }

    #[test]
    fn test_proof_does_not_transfer_between_arities() {
        let mut rng = rand::thread_rng();
        let vault = setup();
        let inputs = [note(&mut rng, 50)];
        let outputs = [note(&mut rng, 20), note(&mut rng, 30)];
        let (proof, signals) = vault
            .pipeline()
            .prove(&Witness::spend(&inputs, &outputs, 0u64), CircuitVariant::Spend12)
            .unwrap();

        // 1-2 and 2-1 both carry four signals
        assert_eq!(signals.len(), CircuitVariant::Spend21.signal_count());
        assert!(vault.pipeline().verify(&proof, &signals, CircuitVariant::Spend12));
        assert!(!vault.pipeline().verify(&proof, &signals, CircuitVariant::Spend21));
    }

    #[test]
    fn test_witness_json_for_cli() {
        let notes = [
            Note::new(10u64, Fr::from(1u64)),
            Note::new(20u64, Fr::from(2u64)),
            Note::new(30u64, Fr::from(3u64)),
        ];
        let witness = Witness::deposit(&notes);
        let json = serde_json::to_string_pretty(&witness).unwrap();
        let dir = std::env::temp_dir();
        std::fs::write(dir.join("test_deposit_witness.json"), &json).unwrap();

        let parsed: Witness = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, witness);
        assert_eq!(
            synthesize(CircuitVariant::Deposit, &parsed)
                .unwrap()
                .total(CircuitVariant::Deposit),
            Some(Fr::from(60u64))
        );
    }

    #[test]
    fn test_calldata_layout() {
        let signals = PublicSignals::spend(&[Fr::from(1u64)], &[Fr::from(2u64)], Fr::from(3u64));
        let call = to_verifier_call_data(&Proof(vec![0xde, 0xad]), &signals);
        let encoded = call.abi_encode();

        // selector, two head words, bytes (len + 1 word), array (len + 3 words)
        assert_eq!(encoded.len(), 4 + 32 * 2 + 32 * 2 + 32 * 4);
        assert_eq!(hex::encode(&encoded[4 + 32 * 2 + 32..][..2]), "dead");
        assert_eq!(call.public_signals(), Some(signals));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const MAX: u64 = 1 << 40;

        fn entropy() -> impl Strategy<Value = Fr> {
            any::<[u8; 32]>().prop_map(Fr::from_be_bytes_reduced)
        }

        fn notes(len: usize) -> impl Strategy<Value = Vec<Note>> {
            prop::collection::vec(
                (0..MAX, entropy()).prop_map(|(a, e)| Note::new(a, e)),
                len,
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn balanced_spends_prove_and_verify(
                inputs in notes(2),
                fee in 0..MAX,
                split in 0u64..=100,
                e0 in entropy(),
                e1 in entropy(),
            ) {
                let total: u64 = inputs.iter().map(|n| n.amount.value().to::<u64>()).sum();
                prop_assume!(total >= fee);
                let rest = total - fee;
                let first = rest / 100 * split;
                let outputs = [Note::new(first, e0), Note::new(rest - first, e1)];

                let pipeline = Pipeline::new(MockBackend::default());
                let (proof, signals) = pipeline
                    .prove(&Witness::spend(&inputs, &outputs, fee), CircuitVariant::Spend22)
                    .unwrap();
                prop_assert!(pipeline.verify(&proof, &signals, CircuitVariant::Spend22));
                prop_assert!(pipeline.verify(&proof, &signals, CircuitVariant::Spend22));
            }

            #[test]
            fn unbalanced_spends_never_prove(
                inputs in notes(3),
                outputs in notes(2),
                fee in 0..MAX,
            ) {
                let sum = |notes: &[Note]| notes.iter().map(|n| n.amount).sum::<Fr>();
                prop_assume!(sum(&inputs) != sum(&outputs) + Fr::from(fee));
                let pipeline = Pipeline::new(MockBackend::default());
                let result = pipeline.prove(&Witness::spend(&inputs, &outputs, fee), CircuitVariant::Spend32);
                prop_assert!(
                    matches!(result, Err(ProofError::Constraint(ConstraintError::SumMismatch))),
                    "expected a sum mismatch"
                );
            }

            #[test]
            fn deposit_total_must_match(
                notes in notes(DEPOSIT_SLOTS),
                delta in 1..MAX,
            ) {
                let mut witness = Witness::deposit(&notes);
                if let Witness::Deposit(w) = &mut witness {
                    w.total_amount = w.total_amount + Fr::from(delta);
                }
                prop_assert!(synthesize(CircuitVariant::Deposit, &witness).is_err());
            }

            #[test]
            fn negative_amounts_never_prove(
                amount in 1..MAX,
                e0 in entropy(),
                e1 in entropy(),
            ) {
                // a -k output lets the other output exceed the input by k
                let input = Note::new(100u64, e0);
                let negative = Note { amount: -Fr::from(amount), entropy: e1 };
                let inflated = Note::new(100 + amount, e1);
                let witness = Witness::spend(&[input], &[inflated, negative], 0u64);
                prop_assert!(matches!(
                    synthesize(CircuitVariant::Spend12, &witness),
                    Err(ConstraintError::AmountOutOfRange { .. })
                ), "expected AmountOutOfRange");
            }

            #[test]
            fn foreign_commitments_never_prove(
                notes in notes(DEPOSIT_SLOTS),
                other in entropy(),
                slot in 0..DEPOSIT_SLOTS,
            ) {
                let mut witness = Witness::deposit(&notes);
                if let Witness::Deposit(w) = &mut witness {
                    prop_assume!(w.hashes[slot] != other);
                    w.hashes[slot] = other;
                }
                prop_assert!(matches!(
                    synthesize(CircuitVariant::Deposit, &witness),
                    Err(ConstraintError::CommitmentMismatch { .. })
                ), "expected CommitmentMismatch");
            }
        }
    }
}
