// ABOUTME: Round-robin distribution of upload rows across eligible assignees
// ABOUTME: Pure index arithmetic over a stable, creation-ordered assignee list

use tasklane_agents::{Agent, UserType};

/// Agents that may receive tasks created by `creator`, in stable order.
///
/// `agents` is expected in creation order; that order is preserved.
pub fn eligible_assignees(creator: &Agent, agents: &[Agent]) -> Vec<Agent> {
    match creator.user_type {
        UserType::Agent => agents
            .iter()
            .filter(|agent| agent.is_active && agent.is_sub_agent_of(&creator.id))
            .cloned()
            .collect(),
        UserType::SubAgent => vec![creator.clone()],
        UserType::Admin => Vec::new(),
    }
}

/// Assignee for the row at zero-based `index`
pub fn assignee_for<T>(index: usize, assignees: &[T]) -> Option<&T> {
    if assignees.is_empty() {
        None
    } else {
        assignees.get(index % assignees.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn agent(id: &str, user_type: UserType, parent: Option<&str>, active: bool) -> Agent {
        Agent {
            id: id.to_string(),
            name: id.to_uppercase(),
            email: format!("{}@example.com", id),
            mobile: "+15550100".to_string(),
            user_type,
            parent_agent_id: parent.map(str::to_string),
            created_by: parent.map(str::to_string),
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_agent_gets_active_own_sub_agents_in_order() {
        let creator = agent("boss", UserType::Agent, None, true);
        let agents = vec![
            agent("a", UserType::SubAgent, Some("boss"), true),
            agent("other", UserType::SubAgent, Some("someone-else"), true),
            agent("idle", UserType::SubAgent, Some("boss"), false),
            agent("peer", UserType::Agent, None, true),
            agent("b", UserType::SubAgent, Some("boss"), true),
        ];

        let ids: Vec<String> = eligible_assignees(&creator, &agents)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_sub_agent_only_assigns_to_itself() {
        let creator = agent("sub", UserType::SubAgent, Some("boss"), true);
        let agents = vec![agent("sibling", UserType::SubAgent, Some("boss"), true)];

        let eligible = eligible_assignees(&creator, &agents);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, "sub");
    }

    #[test]
    fn test_admin_and_childless_agent_have_no_assignees() {
        let admin = agent("root", UserType::Admin, None, true);
        let lonely = agent("lonely", UserType::Agent, None, true);
        let agents = vec![agent("idle", UserType::SubAgent, Some("lonely"), false)];

        assert!(eligible_assignees(&admin, &agents).is_empty());
        assert!(eligible_assignees(&lonely, &agents).is_empty());
    }

    #[test]
    fn test_empty_assignee_list_yields_none() {
        let empty: [&str; 0] = [];
        assert_eq!(assignee_for(0, &empty), None);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(5, 2)]
    #[case(7, 3)]
    #[case(2, 5)]
    #[case(100, 7)]
    fn test_round_robin_is_modular_and_balanced(#[case] rows: usize, #[case] assignees: usize) {
        let pool: Vec<usize> = (0..assignees).collect();
        let mut counts = vec![0usize; assignees];

        for index in 0..rows {
            let assigned = *assignee_for(index, &pool).unwrap();
            assert_eq!(assigned, index % assignees);
            counts[assigned] += 1;
        }

        let max = counts.iter().max().unwrap();
        let min = counts.iter().min().unwrap();
        assert!(max - min <= 1, "unbalanced counts: {:?}", counts);
        assert_eq!(counts.iter().sum::<usize>(), rows);
    }

    #[test]
    fn test_five_rows_two_assignees() {
        let pool = ["A", "B"];
        let assigned: Vec<&str> = (0..5).map(|i| *assignee_for(i, &pool).unwrap()).collect();
        assert_eq!(assigned, vec!["A", "B", "A", "B", "A"]);
    }
}
