pub mod test_connected_transport_opens_channel;
pub mod test_duplicate_offer_ignored;
pub mod test_negotiation_timeout_marks_unreachable;
